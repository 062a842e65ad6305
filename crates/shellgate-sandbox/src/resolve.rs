//! The resolver: user-relative path in, validated absolute path out.

use std::path::{Component, Path, PathBuf};

use crate::SandboxError;

/// A user's sandbox, rooted at their home directory.
///
/// The root is canonicalized once at construction, so the prefix check in
/// [`resolve`](Self::resolve) compares real paths — a root reached through
/// a symlink can't be used to confuse the containment test.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Opens a sandbox over an existing directory.
    ///
    /// # Errors
    /// Returns [`SandboxError::InvalidRoot`] if the directory does not
    /// exist or cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(SandboxError::InvalidRoot)?;
        Ok(Self { root })
    }

    /// The canonicalized sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a user-supplied relative path to an absolute path inside
    /// the sandbox.
    ///
    /// The requested path is joined onto the root and normalized
    /// lexically: `.` segments vanish, `..` segments pop — and popping
    /// past the root is a violation, even if later segments would climb
    /// back in. Absolute components are violations outright. If the
    /// normalized path exists, it is additionally canonicalized and
    /// re-checked, so a symlink inside the sandbox can't point file
    /// operations outside it.
    ///
    /// An empty or `.` request resolves to the root itself.
    ///
    /// # Errors
    /// [`SandboxError::AccessDenied`] for any path that is not provably
    /// inside the root.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, SandboxError> {
        let mut resolved = self.root.clone();

        for component in Path::new(requested).components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() || !resolved.starts_with(&self.root) {
                        tracing::warn!("sandbox violation rejected");
                        return Err(SandboxError::AccessDenied);
                    }
                }
                // Absolute paths and Windows prefixes never resolve.
                Component::RootDir | Component::Prefix(_) => {
                    tracing::warn!("sandbox violation rejected");
                    return Err(SandboxError::AccessDenied);
                }
            }
        }

        if !resolved.starts_with(&self.root) {
            tracing::warn!("sandbox violation rejected");
            return Err(SandboxError::AccessDenied);
        }

        // For paths that already exist, chase symlinks and check again.
        // Nonexistent paths (a file about to be created) keep the lexical
        // result — their parent is what the write will validate.
        if resolved.exists() {
            let real = resolved
                .canonicalize()
                .map_err(|_| SandboxError::AccessDenied)?;
            if !real.starts_with(&self.root) {
                tracing::warn!("sandbox violation rejected (symlink)");
                return Err(SandboxError::AccessDenied);
            }
            return Ok(real);
        }

        Ok(resolved)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The accept/deny table for the resolver. Each rejected case is a
    //! would-be cross-user or cross-filesystem access; each accepted case
    //! is a path a legitimate file browser produces.

    use super::*;

    fn sandbox() -> (tempfile::TempDir, Sandbox) {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        (dir, sandbox)
    }

    // =====================================================================
    // Accepted paths
    // =====================================================================

    #[test]
    fn test_resolve_empty_path_is_root() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve("").unwrap(), sandbox.root());
    }

    #[test]
    fn test_resolve_dot_is_root_and_idempotent() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve(".").unwrap(), sandbox.root());
        // Repeated resolution of "." always lands on the root.
        assert_eq!(sandbox.resolve(".").unwrap(), sandbox.resolve(".").unwrap());
    }

    #[test]
    fn test_resolve_simple_relative_path() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(
            sandbox.resolve("notes/todo.txt").unwrap(),
            sandbox.root().join("notes").join("todo.txt"),
        );
    }

    #[test]
    fn test_resolve_internal_parent_segments_stay_inside() {
        // `a/b/../c` never leaves the sandbox; it must resolve to `a/c`.
        let (_dir, sandbox) = sandbox();
        assert_eq!(
            sandbox.resolve("a/b/../c").unwrap(),
            sandbox.root().join("a").join("c"),
        );
    }

    #[test]
    fn test_resolve_nonexistent_path_is_allowed() {
        // Writes target paths that don't exist yet.
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("new-dir/new-file.rs").unwrap();
        assert!(resolved.starts_with(sandbox.root()));
    }

    // =====================================================================
    // Rejected paths
    // =====================================================================

    #[test]
    fn test_resolve_parent_traversal_denied() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve("../../etc/passwd"),
            Err(SandboxError::AccessDenied)
        ));
    }

    #[test]
    fn test_resolve_single_parent_denied() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve(".."),
            Err(SandboxError::AccessDenied)
        ));
    }

    #[test]
    fn test_resolve_absolute_path_denied() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve("/etc/passwd"),
            Err(SandboxError::AccessDenied)
        ));
    }

    #[test]
    fn test_resolve_escape_then_reenter_denied() {
        // Popping above the root is a violation even if the path would
        // lexically land back inside afterwards.
        let (_dir, sandbox) = sandbox();
        let root_name = sandbox
            .root()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        let sneaky = format!("../{root_name}/file.txt");

        assert!(matches!(
            sandbox.resolve(&sneaky),
            Err(SandboxError::AccessDenied)
        ));
    }

    #[test]
    fn test_resolve_deep_traversal_mixed_with_normals_denied() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve("a/../../outside"),
            Err(SandboxError::AccessDenied)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_out_of_sandbox_denied() {
        let (_dir, sandbox) = sandbox();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), sandbox.root().join("exit"))
            .unwrap();

        assert!(matches!(
            sandbox.resolve("exit"),
            Err(SandboxError::AccessDenied)
        ));
    }

    #[test]
    fn test_new_missing_root_is_invalid() {
        let result = Sandbox::new("/definitely/not/a/real/root");
        assert!(matches!(result, Err(SandboxError::InvalidRoot(_))));
    }
}
