//! Application configuration management.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::storage::StorageProvider;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FILEBIND";

/// Top-level file attachment configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    /// Storage backends keyed by backend name.
    #[serde(default)]
    pub backends: BTreeMap<String, StorageProvider>,
    /// URL adapter service definitions keyed by service id.
    #[serde(default)]
    pub url_adapters: BTreeMap<String, UrlAdapterSettings>,
    /// Ordered backend-to-adapter wiring. First match wins at resolution.
    #[serde(default)]
    pub adapters: Vec<AdapterEntry>,
    /// File field mappings keyed by entity type.
    #[serde(default)]
    pub entities: BTreeMap<String, EntitySettings>,
}

/// URL adapter service definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UrlAdapterSettings {
    /// Time-bounded signed URLs issued by the backend itself.
    Presigned {
        /// Backend the adapter serves.
        backend: String,
        /// Signed URL lifetime in seconds.
        #[serde(default = "default_presign_ttl")]
        ttl_secs: u64,
    },
    /// Public URLs built from a fixed base URL and the file path.
    BaseUrl {
        /// Backend the adapter serves.
        backend: String,
        /// Base URL the backend's files are served under.
        base_url: String,
    },
}

fn default_presign_ttl() -> u64 {
    3600 // 1 hour
}

/// One entry of the backend-to-adapter wiring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdapterEntry {
    /// Backend name.
    pub backend: String,
    /// Service id of the URL adapter.
    pub service: String,
}

/// File field mapping for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntitySettings {
    /// Default path prefix for all fields of the entity.
    pub prefix: String,
    /// Default backend for all fields of the entity.
    pub backend: String,
    /// File-bearing fields.
    #[serde(default)]
    pub fields: Vec<FieldSettings>,
}

/// A single file-bearing field. Unset values fall back to the entity defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSettings {
    /// Field name.
    pub name: String,
    /// Backend override.
    #[serde(default)]
    pub backend: Option<String>,
    /// Name of the field holding the stored path. Defaults to `<name>_path`.
    #[serde(default)]
    pub path_field: Option<String>,
    /// Path prefix override.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl FilesConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Loads configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or invalid.
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
