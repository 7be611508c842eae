//! Text store boundary.
//!
//! Build and settings files are read and written as ordered lines. Lines are
//! the file content split on `\n` only, so joining them back with `\n`
//! reproduces the original bytes; a trailing newline shows up as a final
//! empty line.
//!
//! Stores rewrite existing files, they never create them: `write_lines` on a
//! missing path fails with [`ModspaceError::NotFound`].

use crate::error::{ModspaceError, Result};
use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// Maximum size of a build or settings file accepted by [`FsTextStore`] (8MB).
const MAX_FILE_SIZE: u64 = 8_000_000;

pub trait TextStore: Send + Sync {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>>;

    fn write_lines(&self, path: &Path, lines: &[String]) -> Result<()>;
}

/// Splits file content into lines on `\n`, keeping any `\r`.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}

/// Joins lines with `\n`; the last line gets no terminator.
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

/// Local filesystem store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTextStore;

impl TextStore for FsTextStore {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let metadata = std::fs::metadata(path).map_err(|e| ModspaceError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ModspaceError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if metadata.len() > MAX_FILE_SIZE {
            tracing::error!(
                "File exceeds maximum size: {} bytes (limit: {} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            );
            return Err(ModspaceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other(format!(
                    "file too large: {} bytes (max: {} bytes)",
                    metadata.len(),
                    MAX_FILE_SIZE
                )),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ModspaceError::from_io(path, e))?;
        tracing::trace!("Read {:?} ({} bytes)", path, content.len());
        Ok(split_lines(&content))
    }

    fn write_lines(&self, path: &Path, lines: &[String]) -> Result<()> {
        if !path.is_file() {
            return Err(ModspaceError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = join_lines(lines);
        std::fs::write(path, &content).map_err(|e| ModspaceError::from_io(path, e))?;
        tracing::trace!("Wrote {:?} ({} bytes)", path, content.len());
        Ok(())
    }
}

/// In-memory store keyed by path.
#[derive(Debug, Default)]
pub struct MemoryTextStore {
    files: DashMap<PathBuf, String>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.remove(path).map(|(_, content)| content)
    }
}

impl TextStore for MemoryTextStore {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        self.files
            .get(path)
            .map(|entry| split_lines(entry.value()))
            .ok_or_else(|| ModspaceError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn write_lines(&self, path: &Path, lines: &[String]) -> Result<()> {
        match self.files.get_mut(path) {
            Some(mut entry) => {
                *entry = join_lines(lines);
                Ok(())
            }
            None => Err(ModspaceError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_join_is_lossless() {
        for content in ["", "a", "a\nb", "a\nb\n", "a\r\nb\r\n", "\n\n"] {
            assert_eq!(join_lines(&split_lines(content)), content);
        }
    }

    #[test]
    fn test_split_keeps_trailing_empty_line() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_fs_read_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("build.gradle");
        std::fs::write(&path, "dependencies {\n}\n").unwrap();

        let store = FsTextStore;
        let mut lines = store.read_lines(&path).unwrap();
        assert_eq!(lines, vec!["dependencies {", "}", ""]);

        lines.insert(1, "    api 'a:b:1.0'".to_string());
        store.write_lines(&path, &lines).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "dependencies {\n    api 'a:b:1.0'\n}\n"
        );
    }

    #[test]
    fn test_fs_read_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = FsTextStore.read_lines(&temp_dir.path().join("nope.gradle"));
        assert!(matches!(result, Err(ModspaceError::NotFound { .. })));
    }

    #[test]
    fn test_fs_write_never_creates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.gradle");
        let result = FsTextStore.write_lines(&path, &["include ':app'".to_string()]);
        assert!(matches!(result, Err(ModspaceError::NotFound { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_fs_read_directory_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = FsTextStore.read_lines(temp_dir.path());
        assert!(matches!(result, Err(ModspaceError::NotFound { .. })));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTextStore::new();
        let path = PathBuf::from("/ws/settings.gradle");
        store.insert(&path, "include ':app'\n");

        let lines = store.read_lines(&path).unwrap();
        assert_eq!(lines, vec!["include ':app'", ""]);

        store
            .write_lines(&path, &["include ':core'".to_string(), String::new()])
            .unwrap();
        assert_eq!(store.get(&path).as_deref(), Some("include ':core'\n"));
    }

    #[test]
    fn test_memory_store_missing() {
        let store = MemoryTextStore::new();
        let path = PathBuf::from("/ws/missing.gradle");
        assert!(matches!(
            store.read_lines(&path),
            Err(ModspaceError::NotFound { .. })
        ));
        assert!(matches!(
            store.write_lines(&path, &[]),
            Err(ModspaceError::NotFound { .. })
        ));
        assert!(store.get(&path).is_none());
    }
}
