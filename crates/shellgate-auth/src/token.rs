//! Session token issuance and verification.
//!
//! Tokens are self-contained HS256-signed claims ([`SessionClaims`]): the
//! user's id, name, sandbox root, and optional personal credential, plus
//! iat/exp. There is no server-side session table and no revocation list —
//! a token is valid exactly until its expiry, and logout is client-local.
//!
//! The signing key is process-wide configuration. Anything wrong with a
//! presented token — bad signature, malformed payload, expired — collapses
//! to `None`; callers never learn which check failed, and neither does the
//! client.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{AuthError, SessionClaims, User};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Process-wide signing/verification keys plus the token lifetime.
///
/// Cheap to clone; the meta-crate hands a clone to the HTTP gate (via
/// `FromRef`) and another to the WebSocket supervisor.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    /// Builds keys from the configured secret.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issues a signed token for `user`, expiring after the configured TTL.
    ///
    /// # Errors
    /// Returns [`AuthError::TokenIssue`] if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, unix_now())
    }

    /// Verifies a token. Returns the claims on success, `None` for any
    /// failure — invalid signature, malformed payload, or expiry.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: an expired token is expired, including in tests.
        validation.leeway = 0;
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Issues a token with an explicit issue time. Split out so tests can
    /// backdate tokens instead of sleeping past an expiry.
    fn issue_at(&self, user: &User, iat: u64) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            home: user.home.display().to_string(),
            api_key: user.api_key.clone(),
            iat,
            exp: iat + self.ttl.as_secs(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| AuthError::TokenIssue)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================
