//! Deferred deletion of entity files.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{FileEntity, path_slot};
use crate::error::{ConfigurationError, FilesResult};
use crate::file::FileReference;
use crate::mapping::FieldMapping;
use crate::storage::BackendRegistry;

/// Stages files for deletion and deletes them in one batch on flush.
///
/// Nothing is deleted from storage before [`FileRemover::flush`], so a
/// rolled-back transaction never loses files it still references.
#[derive(Debug)]
pub struct FileRemover {
    backends: Arc<BackendRegistry>,
    mapping: Arc<FieldMapping>,
    pending: Mutex<Vec<FileReference>>,
}

impl FileRemover {
    /// Create a remover with an empty pending set.
    #[must_use]
    pub fn new(backends: Arc<BackendRegistry>, mapping: Arc<FieldMapping>) -> Self {
        Self {
            backends,
            mapping,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Stage every persisted file of an entity for deletion.
    ///
    /// # Errors
    ///
    /// Returns an error if a mapped path field has no accessor.
    pub async fn clear_entity_files<E: FileEntity + ?Sized>(&self, entity: &mut E) -> FilesResult<()> {
        let bindings = self.mapping.bindings_for(entity.entity_type());

        for binding in bindings {
            if let Some(path) = path_slot(entity, binding)?.clone() {
                self.stage(FileReference::new(&binding.backend_name, path)).await;
            }
        }

        Ok(())
    }

    /// Add a file to the pending set. Returns `false` if it was already staged.
    pub async fn stage(&self, reference: FileReference) -> bool {
        let mut pending = self.pending.lock().await;
        if pending.contains(&reference) {
            return false;
        }
        debug!(file = %reference, "Staged file for deletion");
        pending.push(reference);
        true
    }

    /// Drop a file from the pending set. Returns `false` if it was not staged.
    pub async fn unstage(&self, reference: &FileReference) -> bool {
        let mut pending = self.pending.lock().await;
        let before = pending.len();
        pending.retain(|staged| staged != reference);
        let removed = pending.len() != before;
        if removed {
            debug!(file = %reference, "Unstaged file");
        }
        removed
    }

    /// Snapshot of the pending set in staging order.
    pub async fn pending(&self) -> Vec<FileReference> {
        self.pending.lock().await.clone()
    }

    /// Delete every pending file in staging order, then clear the set.
    ///
    /// On failure the files deleted so far leave the set; the failed file and
    /// everything after it stay staged for a later retry.
    ///
    /// # Errors
    ///
    /// Returns the first storage or configuration error, unmodified.
    pub async fn flush(&self) -> FilesResult<usize> {
        let mut pending = self.pending.lock().await;
        let mut deleted = 0;

        while deleted < pending.len() {
            let result = self.delete(&pending[deleted]).await;
            match result {
                Ok(()) => deleted += 1,
                Err(err) => {
                    warn!(
                        file = %pending[deleted],
                        deleted,
                        remaining = pending.len() - deleted,
                        error = %err,
                        "Deferred deletion failed"
                    );
                    pending.drain(..deleted);
                    return Err(err);
                }
            }
        }

        pending.clear();
        if deleted > 0 {
            info!(deleted, "Flushed pending deletions");
        }
        Ok(deleted)
    }

    async fn delete(&self, reference: &FileReference) -> FilesResult<()> {
        let backend = self.backends.get(reference.backend()).ok_or_else(|| {
            ConfigurationError::UnknownBackend {
                backend: reference.backend().to_string(),
            }
        })?;
        backend.delete(reference.path()).await?;
        Ok(())
    }
}
