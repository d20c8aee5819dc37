//! Integration tests for error types

#[cfg(test)]
mod tests {
    use mfsync_errors::*;

    #[test]
    fn test_error_conversion() {
        let sync_err = SyncError::DestinationNotFound {
            path: "/data/out".into(),
        };
        let err: Error = sync_err.into();
        assert!(matches!(err, Error::Sync(_)));
        assert_eq!(err.user_code(), Some("sync.destination_not_found"));
    }

    #[test]
    fn test_missing_field_names_the_key() {
        let err = ConfigError::MissingField {
            field: "INPUTDIR".into(),
        };
        assert_eq!(err.to_string(), "missing required setting: INPUTDIR");
    }

    #[test]
    fn test_error_clone() {
        let err = ManifestError::NotFound {
            path: "files.txt".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err = StorageError::from_io_with_path(&io_err, std::path::Path::new("/x"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));

        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
    }

    #[test]
    fn test_io_with_path_message() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::io_with_path(&io_err, "/dst/a.txt");
        assert_eq!(err.user_message(), "/dst/a.txt: disk on fire");
    }
}
