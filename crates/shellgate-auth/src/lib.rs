//! Credential and session management for Shellgate.
//!
//! This crate owns the durable side of the gateway:
//!
//! 1. **User registry** — a file-backed record-set of users
//!    ([`UserStore`]), rewritten whole on every mutation behind a
//!    single-writer lock.
//! 2. **Passwords** — Argon2 salted hashes, verified in constant time
//!    (never stored or logged in the clear).
//! 3. **Session tokens** — self-contained signed claims with a fixed
//!    expiry ([`TokenKeys`]); all authorization decisions re-validate the
//!    signature server-side.
//! 4. **The gate** — axum extractors ([`Principal`], [`MaybePrincipal`])
//!    that turn a bearer header or cookie into a verified principal.
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP surface / supervisor (above)  ← asks "who is this?"
//!     ↕
//! Auth layer (this crate)            ← registry, hashes, signed claims
//!     ↕
//! Filesystem (below)                 ← one JSON record-set, nothing else
//! ```

mod error;
mod gate;
mod password;
mod store;
mod token;
mod user;

pub use error::{AuthError, StoreError};
pub use gate::{AuthRejection, MaybePrincipal, Principal, TOKEN_COOKIE};
pub use store::UserStore;
pub use token::{TokenKeys, DEFAULT_TOKEN_TTL};
pub use user::{NewUser, SessionClaims, User};
