//! User records and session claims.
//!
//! [`User`] is what the registry persists; [`SessionClaims`] is what a
//! signed token carries. The two deliberately overlap: a token is a
//! self-contained snapshot of the user at login time, so the hot path
//! (every request, every connection) never re-reads the registry.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shellgate_protocol::UserSummary;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A durable user record, one entry in the registry file.
///
/// Created by the bootstrap or user-creation call; mutated only to touch
/// `last_login`; never deleted by the gateway itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable unique id (uuid v4).
    pub id: String,

    /// Unique login name. Uniqueness is enforced at creation.
    pub username: String,

    /// Argon2 hash of the password, PHC string format. The salt lives
    /// inside the string; the clear password is never stored.
    pub password_hash: String,

    /// Absolute path of the user's home directory — the sandbox root for
    /// every file operation and the working directory of every terminal.
    pub home: PathBuf,

    /// Personal API credential handed to the user's terminal processes.
    /// Falls back to the gateway-wide default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// Last successful login, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// The client-visible slice of this record.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            working_directory: self.home.display().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// NewUser
// ---------------------------------------------------------------------------

/// Input for creating a user. The password arrives in the clear exactly
/// once, here, and is hashed before anything is written.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,

    /// Sandbox root override. Defaults to `<homes_root>/<username>`.
    #[serde(default)]
    pub home: Option<PathBuf>,

    /// Personal API credential, if the operator issues one per user.
    #[serde(default)]
    pub api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// SessionClaims
// ---------------------------------------------------------------------------

/// The claims inside a signed session token.
///
/// Opaque to the client; trusted by the server only after signature and
/// expiry verification. Everything a connection needs to run — identity,
/// sandbox root, personal credential — travels in here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id (standard `sub` claim).
    pub sub: String,

    /// Login name, for labels and logs.
    pub username: String,

    /// Absolute sandbox root.
    pub home: String,

    /// Personal API credential, if the user has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Issued-at (unix seconds).
    pub iat: u64,

    /// Expiry (unix seconds). Enforced on every verification.
    pub exp: u64,
}

impl SessionClaims {
    /// The client-visible slice of these claims.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            working_directory: self.home.clone(),
        }
    }
}
