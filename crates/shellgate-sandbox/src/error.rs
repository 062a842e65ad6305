//! Error types for the sandbox layer.

/// Errors from path resolution and sandboxed file operations.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The requested path escapes the sandbox root, or resolution could
    /// not prove it stays inside. The message carries no path detail —
    /// that is what callers return to clients.
    #[error("access denied")]
    AccessDenied,

    /// The sandbox root itself is missing or not a directory.
    #[error("invalid sandbox root: {0}")]
    InvalidRoot(#[source] std::io::Error),

    /// The resolved path does not exist.
    #[error("not found")]
    NotFound,

    /// An in-sandbox filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
