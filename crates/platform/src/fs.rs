//! Filesystem helpers shared by the [`LocalFilesystem`](crate::LocalFilesystem)
//! implementation.

use extman_errors::StorageError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Recursively copy a directory
///
/// # Errors
///
/// Returns an error if:
/// - Creating the destination directory fails
/// - Reading the source directory fails
/// - Copying any file or subdirectory fails
pub async fn copy_directory(src: &Path, dst: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dst)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, dst))?;

    let mut entries = fs::read_dir(src)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, src))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, src))?
    {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        let metadata = entry
            .metadata()
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &src_path))?;
        if metadata.is_dir() {
            Box::pin(copy_directory(&src_path, &dst_path)).await?;
        } else {
            fs::copy(&src_path, &dst_path)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &src_path))?;
        }
    }

    Ok(())
}

/// List the immediate children of `path`, sorted
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub async fn list_dir(path: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path))?;
    let mut children = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path))?
    {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}
