//! Text file access for generated scripts.

use crate::{DdlSyncError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;

/// Reads and writes output files.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Reads a file as text.
    ///
    /// Returns `Ok(None)` when the file does not exist or is empty.
    ///
    /// # Errors
    /// Fails on any other I/O error.
    async fn read_text(&self, path: &Path) -> Result<Option<String>>;

    /// Writes a file, creating missing parent directories.
    ///
    /// # Errors
    /// Fails when a directory or the file cannot be written.
    async fn write_text(&self, path: &Path, text: &str) -> Result<()>;
}

/// [`FileStore`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

#[async_trait]
impl FileStore for LocalFiles {
    async fn read_text(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) if text.is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DdlSyncError::io(
                format!("read file \"{}\"", path.display()),
                e,
            )),
        }
    }

    async fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DdlSyncError::io(format!("create dir \"{}\"", parent.display()), e)
            })?;
        }
        tokio::fs::write(path, text)
            .await
            .map_err(|e| DdlSyncError::io(format!("write file \"{}\"", path.display()), e))
    }
}
