//! Static entity field to backend mapping.

use std::collections::{BTreeMap, HashSet};

use filebind_shared::EntitySettings;

use crate::error::ConfigurationError;
use crate::storage::BackendRegistry;

/// Binds one file field of an entity type to a backend and a path field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFieldBinding {
    /// Entity type the field belongs to.
    pub entity_type: String,
    /// Field holding the `WebFile`.
    pub field_name: String,
    /// Backend the field's files are stored in.
    pub backend_name: String,
    /// Field holding the persisted path.
    pub path_field: String,
    /// Prefix for generated paths.
    pub path_prefix: String,
}

impl EntityFieldBinding {
    /// Create a binding with the default `<field>_path` path field.
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        field_name: impl Into<String>,
        backend_name: impl Into<String>,
        path_prefix: impl Into<String>,
    ) -> Self {
        let field_name = field_name.into();
        Self {
            entity_type: entity_type.into(),
            path_field: default_path_field(&field_name),
            field_name,
            backend_name: backend_name.into(),
            path_prefix: normalize_prefix(&path_prefix.into()),
        }
    }

    /// Override the path field.
    #[must_use]
    pub fn with_path_field(mut self, path_field: impl Into<String>) -> Self {
        self.path_field = path_field.into();
        self
    }
}

/// All bindings, grouped by entity type. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    entities: BTreeMap<String, Vec<EntityFieldBinding>>,
}

impl FieldMapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    #[must_use]
    pub fn with_binding(mut self, binding: EntityFieldBinding) -> Self {
        self.entities
            .entry(binding.entity_type.clone())
            .or_default()
            .push(binding);
        self
    }

    /// Build the mapping from configuration, checking every backend exists.
    ///
    /// # Errors
    ///
    /// Returns an error on empty names or prefixes, duplicate fields or path
    /// fields, or a backend missing from `backends`.
    pub fn from_settings(
        entities: &BTreeMap<String, EntitySettings>,
        backends: &BackendRegistry,
    ) -> Result<Self, ConfigurationError> {
        let mut mapping = Self::new();

        for (entity_type, settings) in entities {
            let invalid = |reason: &str| ConfigurationError::InvalidMapping {
                entity: entity_type.clone(),
                reason: reason.to_string(),
            };

            if normalize_prefix(&settings.prefix).is_empty() {
                return Err(invalid("prefix cannot be empty"));
            }
            if settings.backend.is_empty() {
                return Err(invalid("backend cannot be empty"));
            }

            let mut fields = HashSet::new();
            let mut path_fields = HashSet::new();

            for field in &settings.fields {
                if field.name.is_empty() {
                    return Err(invalid("field name cannot be empty"));
                }

                let backend = field.backend.as_deref().unwrap_or(&settings.backend);
                if !backends.contains(backend) {
                    return Err(ConfigurationError::UnknownBackend {
                        backend: backend.to_string(),
                    });
                }

                let prefix = field.prefix.as_deref().unwrap_or(&settings.prefix);
                let mut binding = EntityFieldBinding::new(
                    entity_type.as_str(),
                    field.name.as_str(),
                    backend,
                    prefix,
                );
                if binding.path_prefix.is_empty() {
                    return Err(invalid(&format!("field \"{}\" has an empty prefix", field.name)));
                }
                if let Some(path_field) = &field.path_field {
                    binding = binding.with_path_field(path_field.as_str());
                }

                if !fields.insert(binding.field_name.clone()) {
                    return Err(invalid(&format!("field \"{}\" is mapped twice", field.name)));
                }
                if !path_fields.insert(binding.path_field.clone()) {
                    return Err(invalid(&format!(
                        "path field \"{}\" is shared by two fields",
                        binding.path_field
                    )));
                }

                mapping = mapping.with_binding(binding);
            }
        }

        Ok(mapping)
    }

    /// Bindings for an entity type. Empty for unmapped types.
    #[must_use]
    pub fn bindings_for(&self, entity_type: &str) -> &[EntityFieldBinding] {
        self.entities
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the entity type has any file fields.
    #[must_use]
    pub fn is_mapped(&self, entity_type: &str) -> bool {
        !self.bindings_for(entity_type).is_empty()
    }

    /// Mapped entity types in name order.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

fn default_path_field(field_name: &str) -> String {
    format!("{field_name}_path")
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_string()
}
