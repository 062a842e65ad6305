//! Error types for the auth layer.

/// Errors surfaced by credential and token operations.
///
/// `InvalidCredentials` is deliberately a single variant for both
/// unknown-user and wrong-password: callers can't distinguish them, so
/// neither can anyone probing for usernames.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad username or password. Never more specific than this.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The username is already taken. The registry is unchanged.
    #[error("username already exists")]
    DuplicateUsername,

    /// The password hasher rejected the input.
    #[error("password hashing failed")]
    HashingFailed,

    /// Signing the token failed.
    #[error("token issuance failed")]
    TokenIssue,

    /// The backing registry failed. See [`StoreError`].
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the registry file itself.
///
/// A corrupt or unreadable registry is loud on purpose: treating it as
/// "no users" would re-open the unauthenticated first-user bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The registry file exists but could not be read.
    #[error("registry read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// The registry file is not valid JSON for the expected record-set.
    #[error("registry is corrupt: {0}")]
    Corrupt(serde_json::Error),

    /// Writing the registry (or its temp file) failed.
    #[error("registry write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Creating a user's home directory failed.
    #[error("home directory setup failed: {0}")]
    HomeSetup(#[source] std::io::Error),
}
