//! The user store: a file-backed registry of user records.
//!
//! Storage is one JSON array, read whole and rewritten whole on every
//! mutation. That is the right shape for this workload — user creation is
//! an infrequent administrative action and logins are low-volume — but it
//! needs two guarantees the naive version lacks:
//!
//! - **Single-writer discipline.** Every read-modify-write cycle holds an
//!   internal async mutex, so two concurrent `create_user` calls can't
//!   silently drop each other's record.
//! - **No partial writes.** The record-set is written to a temp file and
//!   renamed into place, so a crash mid-write leaves the old registry
//!   intact.
//!
//! # Read failures are loud
//!
//! A registry file that does not exist yet is genuinely "no users". A
//! registry file that exists but can't be read or parsed is an error —
//! never an empty set. [`has_any_user`](UserStore::has_any_user) gates the
//! unauthenticated first-user bootstrap, and answering "no users" off a
//! corrupt file would re-open that door.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::password;
use crate::{AuthError, NewUser, StoreError, User};

/// File-backed registry of [`User`] records.
pub struct UserStore {
    /// Location of the registry file.
    path: PathBuf,

    /// Parent directory for defaulted home directories.
    homes_root: PathBuf,

    /// Serializes every read-modify-write cycle. Plain reads skip it —
    /// the rename-into-place write means readers never see a torn file.
    write_lock: Mutex<()>,
}

impl UserStore {
    /// Creates a store over the registry at `path`, defaulting new users'
    /// homes under `homes_root`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>, homes_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            homes_root: homes_root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a new user.
    ///
    /// The password is hashed off the async runtime before any registry
    /// state is touched. The user's home directory is created here, so a
    /// record never exists without a writable sandbox root.
    ///
    /// # Errors
    /// - [`AuthError::DuplicateUsername`] — name taken; registry unchanged.
    /// - [`AuthError::Store`] — the registry could not be read or written.
    pub async fn create_user(&self, new: NewUser) -> Result<User, AuthError> {
        let password = new.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password(&password))
                .await
                .map_err(|_| AuthError::HashingFailed)??;

        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        if users.iter().any(|u| u.username == new.username) {
            return Err(AuthError::DuplicateUsername);
        }

        let home = new
            .home
            .unwrap_or_else(|| self.homes_root.join(&new.username));
        tokio::fs::create_dir_all(&home)
            .await
            .map_err(StoreError::HomeSetup)?;
        // The record always carries the real absolute path; everything
        // downstream (sandbox root, terminal cwd) relies on that.
        let home = tokio::fs::canonicalize(&home)
            .await
            .map_err(StoreError::HomeSetup)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new.username,
            password_hash,
            home,
            api_key: new.api_key,
            created_at: Utc::now(),
            last_login: None,
        };

        users.push(user.clone());
        self.persist(&users).await?;

        tracing::info!(username = %user.username, "user created");
        Ok(user)
    }

    /// Authenticates a username/password pair.
    ///
    /// Verification runs the stored Argon2 hash off the async runtime; the
    /// comparison inside is constant-time. On success, `last_login` is
    /// touched best-effort — a failed timestamp write logs a warning but
    /// does not fail the login.
    ///
    /// # Errors
    /// - [`AuthError::InvalidCredentials`] — unknown user or wrong
    ///   password; the two are indistinguishable by design.
    /// - [`AuthError::Store`] — the registry could not be read.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let users = self.load().await?;
        let Some(user) = users.into_iter().find(|u| u.username == username) else {
            return Err(AuthError::InvalidCredentials);
        };

        let candidate = password.to_string();
        let stored = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || {
            password::verify_password(&candidate, &stored)
        })
        .await
        .unwrap_or(false);

        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.touch_last_login(&user.username).await.unwrap_or(user);
        tracing::info!(username = %user.username, "login succeeded");
        Ok(user)
    }

    /// Whether any user exists.
    ///
    /// Gates the one-time unauthenticated bootstrap. Propagates registry
    /// failures instead of defaulting to `false` — the bootstrap must stay
    /// closed when the registry's state can't be confirmed.
    pub async fn has_any_user(&self) -> Result<bool, StoreError> {
        Ok(!self.load().await?.is_empty())
    }

    /// Looks up a user by username.
    pub async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    /// Path of the backing registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- Internals ---------------------------------------------------------

    /// Re-reads the registry and stamps `last_login` on the named user.
    /// Returns the updated record. Holds the write lock for the full
    /// read-modify-write.
    async fn touch_last_login(&self, username: &str) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        let Some(user) = users.iter_mut().find(|u| u.username == username) else {
            // Deleted out from under us by external tooling; nothing to stamp.
            return Err(StoreError::ReadFailed(std::io::Error::new(
                ErrorKind::NotFound,
                "user vanished during login",
            )));
        };
        user.last_login = Some(Utc::now());
        let updated = user.clone();

        if let Err(e) = self.persist(&users).await {
            tracing::warn!(error = %e, "failed to record last_login");
            return Err(e);
        }
        Ok(updated)
    }

    /// Reads the whole record-set. A missing file is an empty registry;
    /// any other failure is an error.
    async fn load(&self) -> Result<Vec<User>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::ReadFailed(e)),
        };
        serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)
    }

    /// Rewrites the whole record-set: temp file, then rename into place.
    async fn persist(&self, users: &[User]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::WriteFailed)?;
        }

        let json = serde_json::to_vec_pretty(users).map_err(StoreError::Corrupt)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(StoreError::WriteFailed)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StoreError::WriteFailed)
    }
}

// =========================================================================
// Tests
// =========================================================================
