//! Public URL resolution for stored files.
//!
//! ```text
//! FileUrlResolver
//!   ├── (public)  BaseUrlAdapter      → https://cdn.example.com/files/<path>
//!   └── (private) PresignedUrlAdapter → OpenDAL presign_read(<path>, 1h)
//! ```
//!
//! Adapters are tried in registration order; the first one whose
//! [`UrlAdapter::supports`] returns `true` produces the URL.

mod base_url;
mod presigned;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ConfigurationError, FilesResult};
use crate::file::WebFile;

pub use base_url::BaseUrlAdapter;
pub use presigned::{DEFAULT_PRESIGN_TTL, PresignedUrlAdapter};

/// Turns a file into a URL a client can fetch.
#[async_trait]
pub trait UrlAdapter: Send + Sync + fmt::Debug {
    /// Whether this adapter can produce a URL for `file`.
    fn supports(&self, file: &WebFile) -> bool;

    /// Produce the URL. Only called when [`supports`](Self::supports) holds.
    async fn url(&self, file: &WebFile) -> FilesResult<String>;
}

/// Ordered list of URL adapters.
#[derive(Debug, Clone, Default)]
pub struct FileUrlResolver {
    adapters: Vec<(String, Arc<dyn UrlAdapter>)>,
}

impl FileUrlResolver {
    /// Create a resolver with no adapters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter registered for `backend`.
    #[must_use]
    pub fn with_adapter(mut self, backend: impl Into<String>, adapter: Arc<dyn UrlAdapter>) -> Self {
        self.adapters.push((backend.into(), adapter));
        self
    }

    /// Resolve the URL of a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoAdapter`] when no adapter supports the
    /// file. Adapter failures are returned unmodified.
    pub async fn resolve(&self, file: &WebFile) -> FilesResult<String> {
        let Some((backend, adapter)) = self.adapters.iter().find(|(_, a)| a.supports(file)) else {
            return Err(ConfigurationError::NoAdapter {
                file: file.to_string(),
            }
            .into());
        };

        debug!(file = %file, backend = %backend, "Resolving file URL");
        adapter.url(file).await
    }

    /// Backends with an adapter, in registration order.
    pub fn backends(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|(backend, _)| backend.as_str())
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
