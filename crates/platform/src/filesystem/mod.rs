//! Filesystem operations used by the installer

use async_trait::async_trait;
use extman_errors::StorageError;
use std::path::{Path, PathBuf};

use crate::fs;

/// Trait for the filesystem operations an install needs
#[async_trait]
pub trait FilesystemOperations: Send + Sync {
    /// Create directory and all parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError>;

    /// Remove directory and all contents
    async fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError>;

    /// Remove a single file
    async fn remove_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Check if a path exists
    async fn exists(&self, path: &Path) -> bool;

    /// Check if a path points to a directory.
    async fn is_dir(&self, path: &Path) -> bool;

    /// Copy one file, creating the destination's parent directories
    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError>;

    /// Recursively copy a directory
    async fn copy_directory(&self, src: &Path, dst: &Path) -> Result<(), StorageError>;

    /// Read a whole file as UTF-8
    async fn read_to_string(&self, path: &Path) -> Result<String, StorageError>;

    /// Immediate children of a directory, sorted by path
    async fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, StorageError>;

    /// Absolute path with every link resolved
    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, StorageError>;
}

/// `FilesystemOperations` backed by the local disk through `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FilesystemOperations for LocalFilesystem {
    async fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
        }
        tokio::fs::copy(src, dst)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::from_io_with_path(&e, src))
    }

    async fn copy_directory(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        fs::copy_directory(src, dst).await
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, StorageError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, StorageError> {
        fs::list_dir(path).await
    }

    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, StorageError> {
        tokio::fs::canonicalize(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))
    }
}
