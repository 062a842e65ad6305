//! Error types for terminal supervision.

/// Errors from spawning and steering a pty-backed process.
///
/// The pty library reports opaque errors; their messages are carried as
/// strings rather than re-wrapped, matching how callers use them — as
/// text surfaced into the session's terminal output.
#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    /// Opening the pty pair failed.
    #[error("failed to open pty: {0}")]
    Pty(String),

    /// Spawning the child process on the pty failed.
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    /// Resizing the pty failed.
    #[error("resize failed: {0}")]
    Resize(String),

    /// The child process (or its I/O bridge) is gone.
    #[error("terminal process is gone")]
    ProcessGone,
}
