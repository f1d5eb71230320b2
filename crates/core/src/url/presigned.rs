use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::UrlAdapter;
use crate::error::{ConfigurationError, FilesResult};
use crate::file::WebFile;
use crate::storage::StorageBackend;

/// Lifetime of presigned URLs unless configured otherwise.
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// Time-bounded signed URLs issued by an object storage backend.
///
/// Every call signs a fresh URL; nothing is cached.
#[derive(Debug, Clone)]
pub struct PresignedUrlAdapter {
    backend_name: String,
    storage: Arc<StorageBackend>,
    ttl: Duration,
}

impl PresignedUrlAdapter {
    /// Create an adapter signing URLs for `storage` with the default TTL.
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self {
            backend_name: storage.name().to_string(),
            storage,
            ttl: DEFAULT_PRESIGN_TTL,
        }
    }

    /// Override the URL lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// URL lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait]
impl UrlAdapter for PresignedUrlAdapter {
    fn supports(&self, file: &WebFile) -> bool {
        file.is_stored_in(&self.backend_name)
    }

    async fn url(&self, file: &WebFile) -> FilesResult<String> {
        let Some(reference) = file.as_stored() else {
            return Err(ConfigurationError::NoAdapter {
                file: file.to_string(),
            }
            .into());
        };

        Ok(self
            .storage
            .presign_read(reference.path(), self.ttl)
            .await?)
    }
}
