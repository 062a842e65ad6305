//! Password hashing.
//!
//! Argon2id with a fresh random salt per hash, stored in PHC string
//! format (`$argon2id$v=19$...`). Verification goes through the crate's
//! `PasswordVerifier`, which compares in constant time.
//!
//! These functions are CPU-bound by design — callers on the async runtime
//! run them through `spawn_blocking`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::AuthError;

/// Hashes a password with a fresh random salt.
///
/// # Errors
/// Returns [`AuthError::HashingFailed`] if the hasher rejects the input.
/// The underlying cause is intentionally not propagated.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verifies a password against a stored PHC hash string.
///
/// Any parse failure of the stored hash counts as a mismatch — a mangled
/// registry entry must not let anyone in.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
