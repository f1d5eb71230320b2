//! In-process unit of work firing lifecycle events in ORM order.
//!
//! The database write itself is supplied by the caller as a commit closure.
//! Files are only deleted after that closure succeeds.

use thiserror::Error;
use tracing::{debug, info};

use crate::entity::FileEntity;
use crate::error::{FilesError, FilesResult};
use crate::file::FileReference;
use crate::identity_map::{EntityId, EntityState, IdentityMap};
use crate::subscriber::EntityFileSubscriber;

/// Failure of [`UnitOfWork::flush`].
#[derive(Debug, Error)]
pub enum FlushError<E> {
    /// File synchronization failed before or after the commit.
    #[error(transparent)]
    Files(#[from] FilesError),

    /// The caller's commit failed. Nothing staged was deleted.
    #[error("commit failed: {0}")]
    Commit(#[source] E),
}

/// Tracks entities for one request and drives the file subscriber.
#[derive(Debug)]
pub struct UnitOfWork {
    subscriber: EntityFileSubscriber,
    identity_map: IdentityMap,
}

impl UnitOfWork {
    /// Create an empty unit of work.
    #[must_use]
    pub fn new(subscriber: EntityFileSubscriber) -> Self {
        Self {
            subscriber,
            identity_map: IdentityMap::new(),
        }
    }

    /// Track an entity hydrated from the database. Fires `postLoad`.
    pub fn load(&mut self, mut entity: Box<dyn FileEntity>) -> FilesResult<EntityId> {
        self.subscriber.post_load(entity.as_mut())?;
        Ok(self.identity_map.insert(entity, EntityState::Managed))
    }

    /// Schedule a new entity for insertion. Fires `prePersist`.
    pub async fn persist(&mut self, mut entity: Box<dyn FileEntity>) -> FilesResult<EntityId> {
        self.subscriber.pre_persist(entity.as_mut()).await?;
        Ok(self.identity_map.insert(entity, EntityState::New))
    }

    /// Schedule an entity for deletion. Fires `preRemove`.
    ///
    /// A not yet inserted entity is dropped right away; its copied-in files
    /// are staged like any other. Returns `false` for unknown ids.
    pub async fn remove(&mut self, id: EntityId) -> FilesResult<bool> {
        let Some(state) = self.identity_map.state(id) else {
            return Ok(false);
        };
        if state == EntityState::Removed {
            return Ok(true);
        }

        if let Some(entity) = self.identity_map.get_mut(id) {
            self.subscriber.pre_remove(entity).await?;
        }

        if state == EntityState::New {
            self.identity_map.detach(id);
        } else {
            self.identity_map.set_state(id, EntityState::Removed);
        }
        Ok(true)
    }

    /// Write all changes.
    ///
    /// Runs `preFlush` over the identity map, then `commit`, then `postFlush`.
    /// When `commit` fails, `postFlush` does not run and every staged file
    /// stays both in storage and in the pending set.
    pub async fn flush<T, E, F>(&mut self, commit: F) -> Result<T, FlushError<E>>
    where
        F: AsyncFnOnce(&mut IdentityMap) -> Result<T, E>,
    {
        self.subscriber.pre_flush(&mut self.identity_map).await?;

        let committed = commit(&mut self.identity_map)
            .await
            .map_err(FlushError::Commit)?;

        let removed = self.identity_map.ids_in_state(EntityState::Removed);
        let inserted = self.identity_map.ids_in_state(EntityState::New);
        for id in &removed {
            self.identity_map.detach(*id);
        }
        for id in &inserted {
            self.identity_map.set_state(*id, EntityState::Managed);
        }
        debug!(inserted = inserted.len(), removed = removed.len(), "Committed unit of work");

        let deleted = self.subscriber.post_flush().await?;
        info!(deleted, tracked = self.identity_map.len(), "Flushed unit of work");

        Ok(committed)
    }

    /// Mutable access to a tracked entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn FileEntity + 'static)> {
        self.identity_map.get_mut(id)
    }

    /// State of a tracked entity.
    #[must_use]
    pub fn state(&self, id: EntityId) -> Option<EntityState> {
        self.identity_map.state(id)
    }

    /// The identity map.
    #[must_use]
    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }

    /// Files waiting for the next successful flush.
    pub async fn pending_deletions(&self) -> Vec<FileReference> {
        self.subscriber.remover().pending().await
    }

    /// Stop tracking every entity. Staged deletions are kept.
    pub fn clear(&mut self) {
        self.identity_map = IdentityMap::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Arc;

    use crate::entity::test_support::Document;
    use crate::entity::{FileLoader, FileRemover, FileUpdater};
    use crate::file::UploadedFile;
    use crate::mapping::{EntityFieldBinding, FieldMapping};
    use crate::storage::{BackendRegistry, StorageBackend};

    #[derive(Debug, Error)]
    #[error("database unavailable")]
    struct DatabaseDown;

    fn unit_of_work() -> (UnitOfWork, Arc<BackendRegistry>) {
        let backends = Arc::new(
            BackendRegistry::new().with_backend(StorageBackend::memory("public").unwrap()),
        );
        let mapping = Arc::new(
            FieldMapping::new()
                .with_binding(EntityFieldBinding::new("document", "file", "public", "documents")),
        );
        let remover = Arc::new(FileRemover::new(Arc::clone(&backends), Arc::clone(&mapping)));
        let subscriber = EntityFileSubscriber::new(
            FileLoader::new(Arc::clone(&mapping)),
            FileUpdater::new(Arc::clone(&backends), mapping, Arc::clone(&remover)),
            remover,
        );
        (UnitOfWork::new(subscriber), backends)
    }

    fn path_of(uow: &mut UnitOfWork, id: EntityId) -> Option<String> {
        uow.get_mut(id)
            .and_then(|entity| entity.path_slot("file_path").cloned())
            .flatten()
    }

    #[tokio::test]
    async fn test_persist_then_flush_marks_managed() {
        let (mut uow, _) = unit_of_work();
        let id = uow
            .persist(Box::new(Document {
                file: Some(UploadedFile::new("a.png", b"a".to_vec()).into()),
                file_path: None,
            }))
            .await
            .unwrap();
        assert_eq!(uow.state(id), Some(EntityState::New));

        uow.flush(async |_: &mut IdentityMap| Ok::<_, Infallible>(()))
            .await
            .unwrap();

        assert_eq!(uow.state(id), Some(EntityState::Managed));
    }

    #[tokio::test]
    async fn test_remove_new_entity_detaches_and_stages_copy() {
        let (mut uow, backends) = unit_of_work();
        let id = uow
            .persist(Box::new(Document {
                file: Some(UploadedFile::new("a.png", b"a".to_vec()).into()),
                file_path: None,
            }))
            .await
            .unwrap();
        let path = path_of(&mut uow, id).unwrap();

        assert!(uow.remove(id).await.unwrap());
        assert_eq!(uow.state(id), None);
        assert_eq!(uow.pending_deletions().await.len(), 1);

        uow.flush(async |_: &mut IdentityMap| Ok::<_, Infallible>(()))
            .await
            .unwrap();
        assert!(!backends.get("public").unwrap().exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_unknown_id() {
        let (mut uow, _) = unit_of_work();
        let id = uow.load(Box::new(Document::default())).unwrap();
        uow.clear();
        assert!(!uow.remove(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_pending_set() {
        let (mut uow, _) = unit_of_work();
        let id = uow
            .load(Box::new(Document {
                file: None,
                file_path: Some("documents/1/a.png".to_string()),
            }))
            .unwrap();
        uow.remove(id).await.unwrap();

        let err = uow
            .flush(async |_: &mut IdentityMap| Err::<(), _>(DatabaseDown))
            .await
            .unwrap_err();

        assert!(matches!(err, FlushError::Commit(DatabaseDown)));
        assert_eq!(err.to_string(), "commit failed: database unavailable");
        assert_eq!(uow.state(id), Some(EntityState::Removed));
        assert_eq!(
            uow.pending_deletions().await,
            [FileReference::new("public", "documents/1/a.png")]
        );
    }

    #[tokio::test]
    async fn test_commit_sees_synchronized_paths() {
        let (mut uow, _) = unit_of_work();
        let id = uow.load(Box::new(Document::default())).unwrap();
        *uow.get_mut(id).unwrap().file_slot("file").unwrap() =
            Some(UploadedFile::new("late.png", b"l".to_vec()).into());

        let written = uow
            .flush(async |map: &mut IdentityMap| {
                let entity = map.get_mut(id).unwrap();
                Ok::<_, Infallible>(entity.path_slot("file_path").unwrap().clone())
            })
            .await
            .unwrap();

        let written = written.unwrap();
        assert!(written.ends_with("/late.png"));
        assert_eq!(path_of(&mut uow, id), Some(written));
    }
}
