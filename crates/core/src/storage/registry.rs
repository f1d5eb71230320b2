//! Registry of named storage backends.

use std::collections::BTreeMap;
use std::sync::Arc;

use filebind_shared::StorageProvider;
use tracing::debug;

use super::backend::StorageBackend;
use super::error::StorageError;

/// Immutable map of backend name to backend, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<StorageBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider cannot be initialized.
    pub fn from_providers(
        providers: &BTreeMap<String, StorageProvider>,
    ) -> Result<Self, StorageError> {
        let mut registry = Self::new();
        for (name, provider) in providers {
            let backend = StorageBackend::from_provider(name.as_str(), provider)?;
            debug!(backend = %name, kind = provider.kind(), "Registered storage backend");
            registry = registry.with_backend(backend);
        }
        Ok(registry)
    }

    /// Add a backend, replacing one with the same name.
    #[must_use]
    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backends
            .insert(backend.name().to_string(), Arc::new(backend));
        self
    }

    /// Look up a backend by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<StorageBackend>> {
        self.backends.get(name)
    }

    /// Whether a backend with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Registered backend names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// All backends in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<StorageBackend>)> {
        self.backends.iter().map(|(name, backend)| (name.as_str(), backend))
    }
}
