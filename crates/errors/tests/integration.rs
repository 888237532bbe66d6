//! Integration tests for error types

#[cfg(test)]
mod tests {
    use extman_errors::*;

    #[test]
    fn test_error_conversion() {
        let install_err = InstallError::DirectoryExists {
            path: "/srv/site/components/com_blog".into(),
        };
        let err: Error = install_err.into();
        assert!(matches!(err, Error::Install(_)));
        assert!(err.as_install().is_some());
    }

    #[test]
    fn test_error_display() {
        let err = InstallError::SqlBatchFailed {
            phase: "install".into(),
            statement: 2,
            message: "syntax error".into(),
        };
        assert_eq!(
            err.to_string(),
            "install SQL failed at statement 2: syntax error"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = ManifestError::NotFound {
            path: "blog.toml".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::IoError { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err =
            StorageError::from_io_with_path(&io_err, std::path::Path::new("/srv/site"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));
    }

    #[test]
    fn test_user_codes_are_stable() {
        let err: Error = InstallError::ProtectedExtension {
            element: "com_users".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("install.protected_extension"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }
}
