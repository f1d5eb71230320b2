//! Startup wiring of URL adapters to backends.
//!
//! Services are registered under string ids in a type-erased
//! [`ServiceRegistry`]. [`UrlAdapterPass`] then turns the configured
//! `backend -> service` entries into a [`FileUrlResolver`], rejecting bad
//! wiring before anything is served.

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use filebind_shared::AdapterEntry;

use crate::error::ConfigurationError;
use crate::url::{FileUrlResolver, UrlAdapter};

/// Named services of any type.
#[derive(Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Box<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under `id`, replacing any previous one.
    pub fn register<T: Any + Send + Sync>(&mut self, id: impl Into<String>, service: T) {
        self.services.insert(id.into(), Box::new(service));
    }

    /// Register a URL adapter under `id`.
    pub fn register_url_adapter(&mut self, id: impl Into<String>, adapter: Arc<dyn UrlAdapter>) {
        self.register(id, adapter);
    }

    /// Whether any service is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// The service under `id`, if it has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, id: &str) -> Option<&T> {
        self.services.get(id)?.downcast_ref::<T>()
    }

    /// The URL adapter under `id`, if that service is one.
    #[must_use]
    pub fn url_adapter(&self, id: &str) -> Option<Arc<dyn UrlAdapter>> {
        self.get::<Arc<dyn UrlAdapter>>(id).cloned()
    }

    /// Registered service ids in name order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.services.keys()).finish()
    }
}

/// Validates adapter wiring and builds the resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlAdapterPass;

impl UrlAdapterPass {
    /// Build a resolver from ordered `backend -> service` entries.
    ///
    /// The resolver keeps the entry order.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that repeats a backend, names an unknown
    /// service, names a service that is not a URL adapter, or reuses an
    /// adapter instance already wired to another backend.
    pub fn process(
        entries: &[AdapterEntry],
        services: &ServiceRegistry,
    ) -> Result<FileUrlResolver, ConfigurationError> {
        let mut backends = HashSet::new();
        let mut wired: Vec<Arc<dyn UrlAdapter>> = Vec::with_capacity(entries.len());
        let mut resolver = FileUrlResolver::new();

        for entry in entries {
            if !backends.insert(entry.backend.as_str()) {
                return Err(ConfigurationError::DuplicateBackend {
                    backend: entry.backend.clone(),
                });
            }

            if !services.contains(&entry.service) {
                return Err(ConfigurationError::MissingService {
                    service: entry.service.clone(),
                });
            }

            let Some(adapter) = services.url_adapter(&entry.service) else {
                return Err(ConfigurationError::NotAnAdapter {
                    service: entry.service.clone(),
                    backend: entry.backend.clone(),
                });
            };

            if wired.iter().any(|other| Arc::ptr_eq(other, &adapter)) {
                return Err(ConfigurationError::AdapterReused {
                    service: entry.service.clone(),
                });
            }

            debug!(backend = %entry.backend, service = %entry.service, "Wired URL adapter");
            wired.push(Arc::clone(&adapter));
            resolver = resolver.with_adapter(entry.backend.as_str(), adapter);
        }

        info!(adapters = resolver.len(), "URL adapters wired");
        Ok(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileReference;
    use crate::storage::StorageBackend;
    use crate::url::BaseUrlAdapter;
    use rstest::rstest;

    fn entry(backend: &str, service: &str) -> AdapterEntry {
        AdapterEntry {
            backend: backend.to_string(),
            service: service.to_string(),
        }
    }

    fn services() -> ServiceRegistry {
        let mut services = ServiceRegistry::new();
        services.register_url_adapter(
            "public_url",
            Arc::new(BaseUrlAdapter::new("public", "https://cdn.example")),
        );
        services.register_url_adapter(
            "private_url",
            Arc::new(BaseUrlAdapter::new("private", "https://private.example")),
        );
        services.register(
            "storage.public",
            Arc::new(StorageBackend::memory("public").unwrap()),
        );
        services
    }

    #[tokio::test]
    async fn test_valid_wiring_keeps_order() {
        let resolver = UrlAdapterPass::process(
            &[entry("private", "private_url"), entry("public", "public_url")],
            &services(),
        )
        .unwrap();

        assert_eq!(resolver.backends().collect::<Vec<_>>(), ["private", "public"]);
        let url = resolver
            .resolve(&FileReference::new("public", "a.png").into())
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/a.png");
    }

    #[rstest]
    #[case::duplicate_backend(
        vec![entry("public", "public_url"), entry("public", "private_url")],
        ConfigurationError::DuplicateBackend { backend: "public".into() }
    )]
    #[case::missing_service(
        vec![entry("public", "cdn")],
        ConfigurationError::MissingService { service: "cdn".into() }
    )]
    #[case::not_an_adapter(
        vec![entry("public", "storage.public")],
        ConfigurationError::NotAnAdapter { service: "storage.public".into(), backend: "public".into() }
    )]
    #[case::same_service_twice(
        vec![entry("public", "public_url"), entry("private", "public_url")],
        ConfigurationError::AdapterReused { service: "public_url".into() }
    )]
    fn test_rejected_wiring(#[case] entries: Vec<AdapterEntry>, #[case] expected: ConfigurationError) {
        let err = UrlAdapterPass::process(&entries, &services()).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_same_instance_under_two_ids_is_reuse() {
        let mut services = ServiceRegistry::new();
        let shared: Arc<dyn UrlAdapter> = Arc::new(BaseUrlAdapter::new("public", "https://cdn.example"));
        services.register_url_adapter("cdn_a", Arc::clone(&shared));
        services.register_url_adapter("cdn_b", shared);

        let err = UrlAdapterPass::process(
            &[entry("public", "cdn_a"), entry("assets", "cdn_b")],
            &services,
        )
        .unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::AdapterReused {
                service: "cdn_b".into()
            }
        );
    }

    #[test]
    fn test_empty_wiring() {
        let resolver = UrlAdapterPass::process(&[], &ServiceRegistry::new()).unwrap();
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_registry_lookup_by_type() {
        let services = services();
        assert!(services.url_adapter("public_url").is_some());
        assert!(services.url_adapter("storage.public").is_none());
        assert!(services.get::<Arc<StorageBackend>>("storage.public").is_some());
        assert_eq!(
            services.ids().collect::<Vec<_>>(),
            ["private_url", "public_url", "storage.public"]
        );
    }
}
