//! Integration tests for the local filesystem implementation

use extman_platform::{FilesystemOperations, LocalFilesystem};
use tempfile::TempDir;

#[tokio::test]
async fn copy_file_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src.txt");
    tokio::fs::write(&src, b"hello").await.unwrap();

    let fs = LocalFilesystem::new();
    let dst = temp.path().join("a/b/c/dst.txt");
    fs.copy_file(&src, &dst).await.unwrap();

    assert_eq!(fs.read_to_string(&dst).await.unwrap(), "hello");
}

#[tokio::test]
async fn copy_directory_is_recursive() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("tree");
    tokio::fs::create_dir_all(src.join("nested")).await.unwrap();
    tokio::fs::write(src.join("top.txt"), b"1").await.unwrap();
    tokio::fs::write(src.join("nested/deep.txt"), b"2").await.unwrap();

    let fs = LocalFilesystem::new();
    let dst = temp.path().join("copy");
    fs.copy_directory(&src, &dst).await.unwrap();

    assert!(fs.exists(&dst.join("top.txt")).await);
    assert!(fs.exists(&dst.join("nested/deep.txt")).await);
    assert!(fs.is_dir(&dst.join("nested")).await);

    let children = fs.list_dir(&dst).await.unwrap();
    assert_eq!(children, vec![dst.join("nested"), dst.join("top.txt")]);
}

#[tokio::test]
async fn missing_paths_map_to_storage_errors() {
    let temp = TempDir::new().unwrap();
    let fs = LocalFilesystem::new();
    let missing = temp.path().join("nope");

    assert!(!fs.exists(&missing).await);
    let err = fs.remove_dir_all(&missing).await.unwrap_err();
    assert!(matches!(
        err,
        extman_errors::StorageError::PathNotFound { .. }
    ));
}

#[tokio::test]
async fn canonicalize_resolves_dot_segments() {
    let temp = TempDir::new().unwrap();
    let fs = LocalFilesystem::new();
    tokio::fs::create_dir_all(temp.path().join("a/b")).await.unwrap();

    let direct = fs.canonicalize(&temp.path().join("a")).await.unwrap();
    let dotted = fs.canonicalize(&temp.path().join("a/b/..")).await.unwrap();
    assert_eq!(direct, dotted);
    assert!(fs.canonicalize(&temp.path().join("gone")).await.is_err());
}
