//! File attachments for persisted entities.
//!
//! Entities expose file fields holding a [`file::WebFile`] and path fields
//! holding the stored path. An [`subscriber::EntityFileSubscriber`] reacts to
//! ORM lifecycle events and keeps both in sync with pluggable storage
//! backends, deferring deletions until the database commit succeeds.
//!
//! # Modules
//!
//! - `file` - File values held by entity fields
//! - `storage` - Named OpenDAL backends
//! - `mapping` - Entity field to backend bindings
//! - `entity` - Loader, updater and remover
//! - `subscriber` - Lifecycle event routing
//! - `unit_of_work` - Identity map and flush driver
//! - `url` - URL adapters and resolution
//! - `wiring` - Startup validation of adapter wiring
//! - `bootstrap` - Building everything from configuration

pub mod bootstrap;
pub mod entity;
pub mod error;
pub mod file;
pub mod identity_map;
pub mod mapping;
pub mod storage;
pub mod subscriber;
pub mod unit_of_work;
pub mod url;
pub mod wiring;

pub use bootstrap::FileSystem;
pub use error::{ConfigurationError, FilesError, FilesResult};
pub use file::{FileReference, UploadedFile, WebFile};
