//! Sandboxed file operations.
//!
//! The operations behind the gateway's file endpoints: list, read, write,
//! remove. Every one resolves its path argument through the sandbox first;
//! none of them accept a pre-resolved path from outside this crate.

use serde::Serialize;

use crate::{Sandbox, SandboxError};

/// How many leading bytes are inspected when classifying a file as
/// text or binary.
const BINARY_SNIFF_LEN: usize = 8192;

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Byte size for files; 0 for directories.
    pub size: u64,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// The result of reading a file.
///
/// Binary files come back as metadata only — the editor UI has nothing
/// useful to do with their bytes, and shipping them as mangled text helps
/// nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileContent {
    Text { content: String },
    Binary { binary: bool, size: u64 },
}

impl Sandbox {
    /// Lists a directory inside the sandbox, sorted by name.
    ///
    /// # Errors
    /// [`SandboxError::AccessDenied`] for out-of-sandbox paths,
    /// [`SandboxError::NotFound`] if the directory does not exist.
    pub async fn list(&self, requested: &str) -> Result<Vec<DirEntry>, SandboxError> {
        let dir = self.resolve(requested)?;
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SandboxError::NotFound)
            }
            Err(e) => return Err(SandboxError::Io(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let meta = entry.metadata().await?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind: if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: if meta.is_dir() { 0 } else { meta.len() },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Reads a file inside the sandbox.
    ///
    /// Text files return their content; binary files return metadata only.
    ///
    /// # Errors
    /// [`SandboxError::AccessDenied`] for out-of-sandbox paths,
    /// [`SandboxError::NotFound`] if the file does not exist.
    pub async fn read(&self, requested: &str) -> Result<FileContent, SandboxError> {
        let path = self.resolve(requested)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SandboxError::NotFound)
            }
            Err(e) => return Err(SandboxError::Io(e)),
        };

        if looks_binary(&bytes) {
            return Ok(FileContent::Binary {
                binary: true,
                size: bytes.len() as u64,
            });
        }
        match String::from_utf8(bytes) {
            Ok(content) => Ok(FileContent::Text { content }),
            Err(from_utf8) => Ok(FileContent::Binary {
                binary: true,
                size: from_utf8.as_bytes().len() as u64,
            }),
        }
    }

    /// Writes a file inside the sandbox, creating parent directories as
    /// needed. Overwrites silently — last writer wins, by contract.
    ///
    /// # Errors
    /// [`SandboxError::AccessDenied`] for out-of-sandbox paths.
    pub async fn write(
        &self,
        requested: &str,
        bytes: &[u8],
    ) -> Result<(), SandboxError> {
        let path = self.resolve(requested)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Removes a file or directory (recursively) inside the sandbox.
    /// Removing the sandbox root itself is refused.
    ///
    /// # Errors
    /// [`SandboxError::AccessDenied`] for out-of-sandbox paths or the
    /// root, [`SandboxError::NotFound`] if the target does not exist.
    pub async fn remove(&self, requested: &str) -> Result<(), SandboxError> {
        let path = self.resolve(requested)?;
        if path == self.root() {
            return Err(SandboxError::AccessDenied);
        }

        let meta = match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SandboxError::NotFound)
            }
            Err(e) => return Err(SandboxError::Io(e)),
        };

        if meta.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

/// NUL bytes in the head of a file mark it as binary; so does content
/// that is not valid UTF-8 (checked by the caller).
fn looks_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(BINARY_SNIFF_LEN)
        .any(|&b| b == 0)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, Sandbox) {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        (dir, sandbox)
    }

    // =====================================================================
    // write() / read()
    // =====================================================================

    #[tokio::test]
    async fn test_write_then_read_round_trips_text() {
        let (_dir, sandbox) = sandbox();

        sandbox.write("notes.md", b"# hello\n").await.unwrap();
        let content = sandbox.read("notes.md").await.unwrap();

        assert_eq!(
            content,
            FileContent::Text {
                content: "# hello\n".into()
            }
        );
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let (_dir, sandbox) = sandbox();

        sandbox.write("a/b/c.txt", b"deep").await.unwrap();

        assert!(sandbox.root().join("a/b/c.txt").is_file());
    }

    #[tokio::test]
    async fn test_read_binary_file_returns_metadata_only() {
        let (_dir, sandbox) = sandbox();
        let payload = [0x7fu8, b'E', b'L', b'F', 0x00, 0x01, 0x02];
        sandbox.write("tool.bin", &payload).await.unwrap();

        let content = sandbox.read("tool.bin").await.unwrap();

        assert_eq!(
            content,
            FileContent::Binary {
                binary: true,
                size: payload.len() as u64
            }
        );
    }

    #[tokio::test]
    async fn test_read_invalid_utf8_counts_as_binary() {
        let (_dir, sandbox) = sandbox();
        // No NUL bytes, but not valid UTF-8 either.
        sandbox.write("latin1.txt", &[0xC0u8, 0xAF, 0xFE]).await.unwrap();

        let content = sandbox.read("latin1.txt").await.unwrap();

        assert!(matches!(content, FileContent::Binary { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.read("ghost.txt").await,
            Err(SandboxError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_read_traversal_is_denied_before_io() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.read("../../etc/passwd").await,
            Err(SandboxError::AccessDenied)
        ));
    }

    // =====================================================================
    // list()
    // =====================================================================

    #[tokio::test]
    async fn test_list_returns_sorted_entries_with_kinds() {
        let (_dir, sandbox) = sandbox();
        sandbox.write("b.txt", b"bb").await.unwrap();
        sandbox.write("a.txt", b"a").await.unwrap();
        tokio::fs::create_dir(sandbox.root().join("sub"))
            .await
            .unwrap();

        let entries = sandbox.list(".").await.unwrap();

        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "a.txt".into(),
                    kind: EntryKind::File,
                    size: 1
                },
                DirEntry {
                    name: "b.txt".into(),
                    kind: EntryKind::File,
                    size: 2
                },
                DirEntry {
                    name: "sub".into(),
                    kind: EntryKind::Directory,
                    size: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_not_found() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.list("nope").await,
            Err(SandboxError::NotFound)
        ));
    }

    // =====================================================================
    // remove()
    // =====================================================================

    #[tokio::test]
    async fn test_remove_file() {
        let (_dir, sandbox) = sandbox();
        sandbox.write("doomed.txt", b"x").await.unwrap();

        sandbox.remove("doomed.txt").await.unwrap();

        assert!(!sandbox.root().join("doomed.txt").exists());
    }

    #[tokio::test]
    async fn test_remove_directory_is_recursive() {
        let (_dir, sandbox) = sandbox();
        sandbox.write("tree/deep/leaf.txt", b"x").await.unwrap();

        sandbox.remove("tree").await.unwrap();

        assert!(!sandbox.root().join("tree").exists());
    }

    #[tokio::test]
    async fn test_remove_root_is_denied() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.remove(".").await,
            Err(SandboxError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_target_is_not_found() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.remove("ghost").await,
            Err(SandboxError::NotFound)
        ));
    }

    // =====================================================================
    // DTO wire shapes
    // =====================================================================

    #[test]
    fn test_dir_entry_serializes_camel_case() {
        let entry = DirEntry {
            name: "x".into(),
            kind: EntryKind::Directory,
            size: 0,
        };
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "directory");
    }

    #[test]
    fn test_file_content_binary_shape() {
        let json: serde_json::Value = serde_json::to_value(FileContent::Binary {
            binary: true,
            size: 9,
        })
        .unwrap();
        assert_eq!(json["binary"], true);
        assert_eq!(json["size"], 9);
        assert!(json.get("content").is_none());
    }
}
