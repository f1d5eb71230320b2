//! Storage error types.

use thiserror::Error;

/// Failure of a single backend operation. Never retried here.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No file at the path.
    #[error("file not found in backend \"{backend}\": {path}")]
    NotFound {
        /// Backend name.
        backend: String,
        /// Path that was looked up.
        path: String,
    },

    /// The backend's service cannot sign URLs.
    #[error("backend \"{backend}\" cannot presign URLs")]
    PresignNotSupported {
        /// Backend name.
        backend: String,
    },

    /// The backend could not be built from its settings.
    #[error("cannot build backend \"{backend}\": {reason}")]
    Configuration {
        /// Backend name.
        backend: String,
        /// What went wrong.
        reason: String,
    },

    /// Any other failure reported by the service.
    #[error("storage operation failed in backend \"{backend}\": {reason}")]
    Operation {
        /// Backend name.
        backend: String,
        /// Service error text.
        reason: String,
    },

    /// Path is empty, names a directory or escapes the root.
    #[error("invalid file path: {0:?}")]
    InvalidPath(String),
}

impl StorageError {
    /// Translate an OpenDAL error raised while operating on `path`.
    pub(crate) fn from_opendal(backend: &str, path: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                backend: backend.to_string(),
                path: path.to_string(),
            },
            _ => Self::Operation {
                backend: backend.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// Name of the backend involved, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&str> {
        match self {
            Self::NotFound { backend, .. }
            | Self::PresignNotSupported { backend }
            | Self::Configuration { backend, .. }
            | Self::Operation { backend, .. } => Some(backend),
            Self::InvalidPath(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendal::ErrorKind;

    #[test]
    fn test_opendal_kinds_are_classified() {
        let not_found = opendal::Error::new(ErrorKind::NotFound, "gone");
        let unsupported = opendal::Error::new(ErrorKind::Unsupported, "no stat");
        let other = opendal::Error::new(ErrorKind::PermissionDenied, "denied");

        assert!(matches!(
            StorageError::from_opendal("public", "a.png", &not_found),
            StorageError::NotFound { ref path, .. } if path == "a.png"
        ));
        assert!(matches!(
            StorageError::from_opendal("public", "a.png", &unsupported),
            StorageError::Operation { .. }
        ));
        assert!(matches!(
            StorageError::from_opendal("public", "a.png", &other),
            StorageError::Operation { .. }
        ));
    }

    #[test]
    fn test_backend_name() {
        let err = StorageError::NotFound {
            backend: "private".into(),
            path: "scans/a.pdf".into(),
        };
        assert_eq!(err.backend(), Some("private"));
        assert_eq!(err.to_string(), "file not found in backend \"private\": scans/a.pdf");
        assert_eq!(StorageError::InvalidPath(String::new()).backend(), None);
    }
}
