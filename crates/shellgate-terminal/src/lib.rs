//! Pseudo-terminal process supervision for Shellgate.
//!
//! One [`Terminal`] is one child process on a pty: spawned in a chosen
//! working directory with chosen environment overrides, producing an
//! ordered stream of [`TerminalEvent`]s (output chunks, then exactly one
//! exit event), and killed the moment its handle is dropped.
//!
//! The pty reader and writer are blocking; they run on dedicated blocking
//! tasks bridged to the async world with channels, so the session task
//! that owns the [`Terminal`] never blocks the runtime.

mod error;
mod terminal;

pub use error::TerminalError;
pub use terminal::{TermSize, Terminal, TerminalEvent, TerminalSpec};
