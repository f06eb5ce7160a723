// src/core/fs_ops.rs
//! File system helpers for the persisted state.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::StoreError;

pub struct FsOps;

impl FsOps {
    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Ensure directory exists
    pub async fn ensure_dir_exists(path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .map_err(|e| Self::io_error(path, e))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Read a file, `None` when it does not exist.
    pub async fn read_if_exists(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(path, e)),
        }
    }

    /// Write through a sibling temp file and rename, so readers never see a
    /// half-written document.
    pub async fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::ensure_dir_exists(parent).await?;
        }

        let temp = Self::temp_path(path);
        fs::write(&temp, content)
            .await
            .map_err(|e| Self::io_error(&temp, e))?;
        fs::rename(&temp, path)
            .await
            .map_err(|e| Self::io_error(path, e))?;

        info!("Written file: {}", path.display());
        Ok(())
    }

    /// Remove a file; a file that is already gone is fine.
    pub async fn remove_if_exists(path: &Path) -> Result<bool, StoreError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                info!("Removed file: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(path, e)),
        }
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_creates_parent_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        FsOps::write_atomic(&path, "{}").await.unwrap();

        assert_eq!(FsOps::read_if_exists(&path).await.unwrap().as_deref(), Some("{}"));
        assert!(!FsOps::temp_path(&path).exists());
    }

    #[tokio::test]
    async fn missing_file_reads_as_none_and_removes_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert_eq!(FsOps::read_if_exists(&path).await.unwrap(), None);
        assert!(!FsOps::remove_if_exists(&path).await.unwrap());
    }
}
