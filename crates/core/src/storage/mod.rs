//! Storage backends for entity files using Apache OpenDAL.
//!
//! Each configured backend is a named OpenDAL operator. Supported providers:
//! - S3-compatible object stores
//! - Azure Blob Storage
//! - Local filesystem
//! - In-process memory
//!
//! # Architecture
//!
//! ```text
//! FileUpdater ──write/read──┐
//! FileRemover ──delete──────┼──> BackendRegistry ──name──> StorageBackend ──> OpenDAL Operator
//! PresignedUrlAdapter ──────┘                               (path checks, error context, logs)
//! ```
//!
//! Backends are built once at startup and shared behind `Arc`.

mod backend;
mod error;
mod registry;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use registry::BackendRegistry;
