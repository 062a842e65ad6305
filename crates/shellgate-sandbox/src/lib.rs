//! Per-user path sandboxing for Shellgate.
//!
//! Every user owns one home directory; nothing a user requests — read,
//! write, list, upload, delete — may touch a path outside it. [`Sandbox`]
//! is that boundary: construct one per home directory, and route every
//! requested path through [`Sandbox::resolve`] before the filesystem sees
//! it. There is no other line of defense.
//!
//! Resolution fails closed: absolute paths, `..` escapes, and symlinks
//! pointing out of the sandbox all come back as
//! [`SandboxError::AccessDenied`], with no detail about what was tried.

mod error;
mod resolve;
mod workspace;

pub use error::SandboxError;
pub use resolve::Sandbox;
pub use workspace::{DirEntry, EntryKind, FileContent};
