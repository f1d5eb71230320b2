//! Named storage backend on top of Apache OpenDAL.

use std::time::Duration;

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use tracing::{debug, info};

use filebind_shared::StorageProvider;

use super::error::StorageError;

/// A storage backend: one OpenDAL operator under a configured name.
#[derive(Debug)]
pub struct StorageBackend {
    name: String,
    kind: &'static str,
    operator: Operator,
}

impl StorageBackend {
    /// Create a backend from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(
        name: impl Into<String>,
        provider: &StorageProvider,
    ) -> Result<Self, StorageError> {
        let name = name.into();
        let operator = create_operator(&name, provider)?;
        Ok(Self {
            name,
            kind: provider.kind(),
            operator,
        })
    }

    /// In-process memory backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn memory(name: impl Into<String>) -> Result<Self, StorageError> {
        Self::from_provider(name, &StorageProvider::Memory)
    }

    /// Backend name as configured.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider kind (`s3`, `local`, ...).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Write contents under `path`, replacing any existing object.
    pub async fn write(&self, path: &str, contents: Bytes) -> Result<(), StorageError> {
        validate_path(path)?;
        let size = contents.len();
        self.operator
            .write(path, contents)
            .await
            .map_err(|e| self.error(path, &e))?;
        info!(backend = %self.name, path, size, "Stored file");
        Ok(())
    }

    /// Read the full contents stored under `path`.
    pub async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        let buffer = self.operator.read(path).await.map_err(|e| self.error(path, &e))?;
        Ok(buffer.to_bytes())
    }

    /// Delete a file. Deleting a missing file succeeds.
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.operator.delete(path).await.map_err(|e| self.error(path, &e))?;
        info!(backend = %self.name, path, "Deleted file");
        Ok(())
    }

    /// Whether a file exists under `path`.
    pub async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self.operator.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.error(path, &e)),
        }
    }

    /// Sign a time-bounded download URL.
    ///
    /// # Errors
    ///
    /// [`StorageError::PresignNotSupported`] for services without signing,
    /// such as the local filesystem and memory.
    pub async fn presign_read(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        let presigned = self
            .operator
            .presign_read(path, ttl)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Unsupported => StorageError::PresignNotSupported {
                    backend: self.name.clone(),
                },
                _ => self.error(path, &e),
            })?;
        debug!(backend = %self.name, path, ttl_secs = ttl.as_secs(), "Presigned read");
        Ok(presigned.uri().to_string())
    }

    fn error(&self, path: &str, err: &opendal::Error) -> StorageError {
        StorageError::from_opendal(&self.name, path, err)
    }
}

fn create_operator(name: &str, provider: &StorageProvider) -> Result<Operator, StorageError> {
    let configuration = |reason: String| StorageError::Configuration {
        backend: name.to_string(),
        reason,
    };

    let operator = match provider {
        StorageProvider::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        } => Operator::new(
            services::S3::default()
                .endpoint(endpoint)
                .bucket(bucket)
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key)
                .region(region),
        )
        .map(|b| b.finish()),
        StorageProvider::AzureBlob {
            account,
            access_key,
            container,
        } => Operator::new(
            services::Azblob::default()
                .account_name(account)
                .account_key(access_key)
                .container(container),
        )
        .map(|b| b.finish()),
        StorageProvider::LocalFs { root } => {
            let root = root
                .to_str()
                .ok_or_else(|| configuration(format!("root {} is not UTF-8", root.display())))?;
            Operator::new(services::Fs::default().root(root)).map(|b| b.finish())
        }
        StorageProvider::Memory => Operator::new(services::Memory::default()).map(|b| b.finish()),
    };

    operator.map_err(|e| configuration(e.to_string()))
}

/// Paths must name a file inside the backend root.
fn validate_path(path: &str) -> Result<(), StorageError> {
    let escapes = path.split('/').any(|segment| segment == "..");
    if path.is_empty() || path.ends_with('/') || escapes {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}
