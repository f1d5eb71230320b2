//! Builds the whole file layer from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use filebind_shared::{FilesConfig, StorageProvider, UrlAdapterSettings};

use crate::entity::{FileLoader, FileRemover, FileUpdater};
use crate::error::{ConfigurationError, FilesResult};
use crate::mapping::FieldMapping;
use crate::storage::{BackendRegistry, StorageBackend};
use crate::subscriber::EntityFileSubscriber;
use crate::unit_of_work::UnitOfWork;
use crate::url::{BaseUrlAdapter, FileUrlResolver, PresignedUrlAdapter, UrlAdapter};
use crate::wiring::{ServiceRegistry, UrlAdapterPass};

/// Service id prefix under which storage backends are registered.
pub const STORAGE_SERVICE_PREFIX: &str = "storage.";

/// Longest presigned URL lifetime S3 accepts (seven days).
pub const MAX_PRESIGN_TTL_SECS: u64 = 604_800;

/// Fully wired file layer. Immutable once built.
#[derive(Debug)]
pub struct FileSystem {
    backends: Arc<BackendRegistry>,
    mapping: Arc<FieldMapping>,
    services: ServiceRegistry,
    resolver: FileUrlResolver,
}

impl FileSystem {
    /// Build backends, mapping, adapter services and the URL resolver.
    ///
    /// # Errors
    ///
    /// Returns the first storage or configuration error found.
    pub fn from_config(config: &FilesConfig) -> FilesResult<Self> {
        let backends = BackendRegistry::from_providers(&config.backends)?;
        let mapping = FieldMapping::from_settings(&config.entities, &backends)?;

        let mut services = ServiceRegistry::new();
        for (name, backend) in backends.iter() {
            services.register(format!("{STORAGE_SERVICE_PREFIX}{name}"), Arc::clone(backend));
        }
        for (id, settings) in &config.url_adapters {
            let adapter = build_adapter(id, settings, config, &backends)?;
            services.register_url_adapter(id.as_str(), adapter);
        }

        for entry in &config.adapters {
            lookup(&backends, &entry.backend)?;
            if let Some(settings) = config.url_adapters.get(&entry.service) {
                let serves = served_backend(settings);
                if serves != entry.backend {
                    return Err(ConfigurationError::AdapterBackendMismatch {
                        service: entry.service.clone(),
                        backend: entry.backend.clone(),
                        serves: serves.to_string(),
                    }
                    .into());
                }
            }
        }
        let resolver = UrlAdapterPass::process(&config.adapters, &services)?;

        info!(
            backends = backends.names().count(),
            entities = mapping.entity_types().count(),
            url_adapters = resolver.len(),
            "File system ready"
        );

        Ok(Self {
            backends: Arc::new(backends),
            mapping: Arc::new(mapping),
            services,
            resolver,
        })
    }

    /// Storage backends.
    #[must_use]
    pub fn backends(&self) -> &Arc<BackendRegistry> {
        &self.backends
    }

    /// Entity field mapping.
    #[must_use]
    pub fn mapping(&self) -> &Arc<FieldMapping> {
        &self.mapping
    }

    /// Registered services.
    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// URL resolver.
    #[must_use]
    pub fn resolver(&self) -> &FileUrlResolver {
        &self.resolver
    }

    /// A subscriber with its own, empty pending deletion set.
    #[must_use]
    pub fn subscriber(&self) -> EntityFileSubscriber {
        let remover = Arc::new(FileRemover::new(
            Arc::clone(&self.backends),
            Arc::clone(&self.mapping),
        ));
        EntityFileSubscriber::new(
            FileLoader::new(Arc::clone(&self.mapping)),
            FileUpdater::new(
                Arc::clone(&self.backends),
                Arc::clone(&self.mapping),
                Arc::clone(&remover),
            ),
            remover,
        )
    }

    /// A fresh unit of work.
    #[must_use]
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.subscriber())
    }
}

fn build_adapter(
    id: &str,
    settings: &UrlAdapterSettings,
    config: &FilesConfig,
    backends: &BackendRegistry,
) -> FilesResult<Arc<dyn UrlAdapter>> {
    let adapter: Arc<dyn UrlAdapter> = match settings {
        UrlAdapterSettings::Presigned { backend, ttl_secs } => {
            let storage = lookup(backends, backend)?;
            if !(1..=MAX_PRESIGN_TTL_SECS).contains(ttl_secs) {
                return Err(ConfigurationError::InvalidPresignTtl {
                    service: id.to_string(),
                    ttl_secs: *ttl_secs,
                }
                .into());
            }
            let presignable = config
                .backends
                .get(backend)
                .is_some_and(StorageProvider::supports_presign);
            if !presignable {
                return Err(ConfigurationError::PresignUnavailable {
                    service: id.to_string(),
                    backend: backend.clone(),
                }
                .into());
            }
            Arc::new(
                PresignedUrlAdapter::new(Arc::clone(storage))
                    .with_ttl(Duration::from_secs(*ttl_secs)),
            )
        }
        UrlAdapterSettings::BaseUrl { backend, base_url } => {
            lookup(backends, backend)?;
            Arc::new(BaseUrlAdapter::new(backend.as_str(), base_url.as_str()))
        }
    };
    Ok(adapter)
}

fn served_backend(settings: &UrlAdapterSettings) -> &str {
    match settings {
        UrlAdapterSettings::Presigned { backend, .. }
        | UrlAdapterSettings::BaseUrl { backend, .. } => backend,
    }
}

fn lookup<'a>(
    backends: &'a BackendRegistry,
    name: &str,
) -> Result<&'a Arc<StorageBackend>, ConfigurationError> {
    backends
        .get(name)
        .ok_or_else(|| ConfigurationError::UnknownBackend {
            backend: name.to_string(),
        })
}
