//! Shared configuration for filebind.
//!
//! This crate provides the declarative configuration surface used by every
//! other crate:
//! - Storage provider settings per named backend
//! - URL adapter service definitions and backend wiring
//! - Entity file field mappings

pub mod config;
pub mod storage;

pub use config::{AdapterEntry, EntitySettings, FieldSettings, FilesConfig, UrlAdapterSettings};
pub use storage::StorageProvider;
