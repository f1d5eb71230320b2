//! Detects file field changes and copies new content into storage.

use std::sync::Arc;

use tracing::{debug, info};

use super::path::generate_path;
use super::{FileEntity, FileRemover, file_slot, path_slot};
use crate::error::{ConfigurationError, FilesResult};
use crate::file::{FileReference, UploadedFile, WebFile};
use crate::mapping::{EntityFieldBinding, FieldMapping};
use crate::storage::{BackendRegistry, StorageBackend};

/// Brings persisted paths in line with in-memory file fields.
///
/// Replaced and cleared files are handed to the [`FileRemover`]; they are
/// deleted only when the remover flushes.
#[derive(Debug, Clone)]
pub struct FileUpdater {
    backends: Arc<BackendRegistry>,
    mapping: Arc<FieldMapping>,
    remover: Arc<FileRemover>,
}

impl FileUpdater {
    /// Create a new updater.
    #[must_use]
    pub fn new(
        backends: Arc<BackendRegistry>,
        mapping: Arc<FieldMapping>,
        remover: Arc<FileRemover>,
    ) -> Self {
        Self {
            backends,
            mapping,
            remover,
        }
    }

    /// Synchronize every mapped file field of an entity.
    ///
    /// Unchanged fields do not touch storage, so running this again right
    /// after a successful run is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if a mapped field has no accessor, a backend is not
    /// registered, or a storage operation fails.
    pub async fn update_files<E: FileEntity + ?Sized>(&self, entity: &mut E) -> FilesResult<()> {
        let bindings = self.mapping.bindings_for(entity.entity_type());

        for binding in bindings {
            self.update_field(entity, binding).await?;
        }

        Ok(())
    }

    async fn update_field<E: FileEntity + ?Sized>(
        &self,
        entity: &mut E,
        binding: &EntityFieldBinding,
    ) -> FilesResult<()> {
        let previous = path_slot(entity, binding)?
            .clone()
            .map(|path| FileReference::new(&binding.backend_name, path));
        let file = file_slot(entity, binding)?.clone();

        let stored = match file {
            None => {
                let Some(previous) = previous else {
                    return Ok(());
                };
                debug!(entity = %binding.entity_type, field = %binding.field_name, "File field cleared");
                self.remover.stage(previous).await;
                *path_slot(entity, binding)? = None;
                return Ok(());
            }
            Some(WebFile::Stored(reference)) if previous.as_ref() == Some(&reference) => {
                return Ok(());
            }
            Some(WebFile::Stored(reference)) => self.adopt(binding, reference).await?,
            Some(WebFile::Uploaded(upload)) => self.copy_in(binding, &upload).await?,
        };

        if let Some(previous) = previous {
            self.remover.stage(previous).await;
        }
        *path_slot(entity, binding)? = Some(stored.path().to_string());
        *file_slot(entity, binding)? = Some(WebFile::Stored(stored));

        Ok(())
    }

    /// Write an upload under a freshly generated path.
    async fn copy_in(
        &self,
        binding: &EntityFieldBinding,
        upload: &UploadedFile,
    ) -> FilesResult<FileReference> {
        let backend = self.backend(&binding.backend_name)?;
        let path = generate_path(&binding.path_prefix, &upload.filename);

        backend.write(&path, upload.contents.clone()).await?;
        info!(
            entity = %binding.entity_type,
            field = %binding.field_name,
            backend = %binding.backend_name,
            path = %path,
            size = upload.size(),
            content_type = upload.content_type.as_deref().unwrap_or("unknown"),
            "Copied upload into storage"
        );

        Ok(FileReference::new(&binding.backend_name, path))
    }

    /// Take over an already stored file.
    ///
    /// Files from the binding's own backend are used in place; files from
    /// another backend are copied over under a new path.
    async fn adopt(
        &self,
        binding: &EntityFieldBinding,
        reference: FileReference,
    ) -> FilesResult<FileReference> {
        if reference.backend() == binding.backend_name {
            self.remover.unstage(&reference).await;
            debug!(file = %reference, field = %binding.field_name, "Adopted stored file");
            return Ok(reference);
        }

        let source = self.backend(reference.backend())?;
        let target = self.backend(&binding.backend_name)?;
        let path = generate_path(&binding.path_prefix, reference.filename());

        let contents = source.read(reference.path()).await?;
        target.write(&path, contents).await?;
        info!(from = %reference, backend = %binding.backend_name, path = %path, "Copied file across backends");

        Ok(FileReference::new(&binding.backend_name, path))
    }

    fn backend(&self, name: &str) -> FilesResult<&Arc<StorageBackend>> {
        self.backends.get(name).ok_or_else(|| {
            ConfigurationError::UnknownBackend {
                backend: name.to_string(),
            }
            .into()
        })
    }
}
