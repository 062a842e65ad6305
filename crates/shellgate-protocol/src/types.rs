//! Realtime event types for Shellgate's wire format.
//!
//! Every event that travels over a terminal session's connection is one of
//! the variants below. Events are internally tagged
//! (`#[serde(tag = "type")]`) so a client sees flat JSON objects like
//! `{ "type": "auth", "token": "..." }` — the format browser-side code
//! works with directly.
//!
//! Tag names are kebab-case (`auth-success`, not `AuthSuccess`) to match
//! the wire protocol the client SDK expects.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UserSummary
// ---------------------------------------------------------------------------

/// The client-visible slice of a user record.
///
/// Sent in [`ServerEvent::AuthSuccess`] and in HTTP login responses. Never
/// carries credentials or hashes — just enough for the client to label the
/// session and scope its file browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// The user's login name.
    pub username: String,
    /// Absolute path of the user's sandbox root.
    pub working_directory: String,
}

// ---------------------------------------------------------------------------
// ClientEvent — what the browser sends
// ---------------------------------------------------------------------------

/// Events sent by the client over a session connection.
///
/// A connection starts unauthenticated; the first meaningful event must be
/// [`ClientEvent::Auth`]. `Data` and `Resize` are only acted on once a
/// terminal is running — the supervisor ignores them otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Present a session token for verification.
    ///
    /// May be retried after an `auth-failed` response — the server keeps
    /// the connection open.
    Auth { token: String },

    /// Raw terminal input. Written verbatim to the child process's stdin.
    Data { data: String },

    /// The client's terminal was resized. Updates the pty geometry
    /// without restarting the process.
    Resize { cols: u16, rows: u16 },
}

// ---------------------------------------------------------------------------
// ServerEvent — what the gateway sends
// ---------------------------------------------------------------------------

/// Events sent by the gateway over a session connection.
///
/// Happy-path ordering after a valid `auth`:
///
/// ```text
/// auth-success → progress* → ready → data* → exit
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// The presented token was valid; the session is being prepared.
    AuthSuccess { user: UserSummary },

    /// The presented token was rejected. The reason is intentionally
    /// generic — it never distinguishes unknown users from bad tokens.
    AuthFailed { reason: String },

    /// A human-readable progress line emitted while tool plugins are
    /// being provisioned. Free text, one line per attempt.
    Progress { message: String },

    /// The terminal process is running and relaying.
    Ready,

    /// Raw terminal output, forwarded verbatim and in order.
    Data { data: String },

    /// The terminal process exited with the given code. No further
    /// `data` events follow.
    Exit { code: i32 },
}

// =========================================================================
// Tests
// =========================================================================
