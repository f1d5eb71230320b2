use async_trait::async_trait;

use super::UrlAdapter;
use crate::error::FilesResult;
use crate::file::WebFile;

/// URLs under a fixed public base, for backends served directly.
#[derive(Debug, Clone)]
pub struct BaseUrlAdapter {
    backend_name: String,
    base_url: String,
}

impl BaseUrlAdapter {
    /// Create an adapter serving `backend_name` under `base_url`.
    #[must_use]
    pub fn new(backend_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            backend_name: backend_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl UrlAdapter for BaseUrlAdapter {
    fn supports(&self, file: &WebFile) -> bool {
        file.is_stored_in(&self.backend_name)
    }

    async fn url(&self, file: &WebFile) -> FilesResult<String> {
        let path = file.as_stored().map_or("", |r| r.path());
        Ok(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
    }
}
