//! Crate-wide error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias using `FilesError`.
pub type FilesResult<T> = Result<T, FilesError>;

/// Wiring and dispatch failures. Never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Two adapter entries name the same backend.
    #[error("duplicate entry for backend \"{backend}\"")]
    DuplicateBackend {
        /// Backend name.
        backend: String,
    },

    /// A mapping or adapter refers to a backend that was never configured.
    #[error("unknown backend \"{backend}\"")]
    UnknownBackend {
        /// Backend name.
        backend: String,
    },

    /// An adapter entry refers to a service that is not registered.
    #[error("service \"{service}\" is not registered")]
    MissingService {
        /// Service id.
        service: String,
    },

    /// The service exists but is not a URL adapter.
    #[error("service \"{service}\" for backend \"{backend}\" is not a URL adapter")]
    NotAnAdapter {
        /// Service id.
        service: String,
        /// Backend name.
        backend: String,
    },

    /// The same adapter instance is wired to more than one backend.
    #[error("service \"{service}\" is used more than one time")]
    AdapterReused {
        /// Service id.
        service: String,
    },

    /// A presigning adapter is wired to a backend that cannot sign URLs.
    #[error("service \"{service}\" presigns URLs but backend \"{backend}\" cannot")]
    PresignUnavailable {
        /// Service id.
        service: String,
        /// Backend name.
        backend: String,
    },

    /// Presigned URL lifetime outside `1..=604800` seconds.
    #[error("service \"{service}\" has presign TTL {ttl_secs}s, expected 1 to 604800")]
    InvalidPresignTtl {
        /// Service id.
        service: String,
        /// Configured lifetime in seconds.
        ttl_secs: u64,
    },

    /// An adapter entry wires a service to a backend it was not built for.
    #[error("service \"{service}\" serves backend \"{serves}\", not \"{backend}\"")]
    AdapterBackendMismatch {
        /// Service id.
        service: String,
        /// Backend named by the entry.
        backend: String,
        /// Backend the service was configured with.
        serves: String,
    },

    /// No registered adapter supports the file.
    #[error("no URL adapter supports file {file}")]
    NoAdapter {
        /// Display form of the file.
        file: String,
    },

    /// Entity field mapping is malformed.
    #[error("invalid mapping for \"{entity}\": {reason}")]
    InvalidMapping {
        /// Entity type.
        entity: String,
        /// What is wrong.
        reason: String,
    },
}

/// Errors surfaced by loaders, updaters, removers and URL resolution.
#[derive(Debug, Error)]
pub enum FilesError {
    /// Wiring or dispatch failure.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Storage backend failure, propagated unmodified.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A mapped field has no accessor on the entity.
    #[error("entity \"{entity}\" has no field \"{field}\"")]
    UnknownField {
        /// Entity type.
        entity: String,
        /// Field name.
        field: String,
    },
}

impl FilesError {
    /// Create an unknown field error.
    #[must_use]
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Whether this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this is a storage error.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
