//! ORM lifecycle subscriber keeping entity files in sync with storage.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::entity::{FileEntity, FileLoader, FileRemover, FileUpdater};
use crate::error::FilesResult;
use crate::identity_map::IdentityMap;

/// Lifecycle points the subscriber reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Entity hydrated from the database.
    PostLoad,
    /// New entity about to be inserted.
    PrePersist,
    /// Entity about to be deleted.
    PreRemove,
    /// Unit of work about to write its changes.
    PreFlush,
    /// Unit of work committed.
    PostFlush,
}

impl LifecycleEvent {
    /// Event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PostLoad => "postLoad",
            Self::PrePersist => "prePersist",
            Self::PreRemove => "preRemove",
            Self::PreFlush => "preFlush",
            Self::PostFlush => "postFlush",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SUBSCRIBED_EVENTS: [LifecycleEvent; 5] = [
    LifecycleEvent::PostLoad,
    LifecycleEvent::PrePersist,
    LifecycleEvent::PreRemove,
    LifecycleEvent::PreFlush,
    LifecycleEvent::PostFlush,
];

/// Routes lifecycle events to the loader, updater and remover.
///
/// Errors from the collaborators are returned unmodified. Rollback decisions
/// belong to whoever drives the transaction.
#[derive(Debug, Clone)]
pub struct EntityFileSubscriber {
    loader: FileLoader,
    updater: FileUpdater,
    remover: Arc<FileRemover>,
}

impl EntityFileSubscriber {
    /// Create a subscriber from its collaborators.
    #[must_use]
    pub fn new(loader: FileLoader, updater: FileUpdater, remover: Arc<FileRemover>) -> Self {
        Self {
            loader,
            updater,
            remover,
        }
    }

    /// Events this subscriber handles.
    #[must_use]
    pub fn subscribed_events(&self) -> &'static [LifecycleEvent] {
        &SUBSCRIBED_EVENTS
    }

    /// Populate file fields of a freshly loaded entity.
    pub fn post_load<E: FileEntity + ?Sized>(&self, entity: &mut E) -> FilesResult<()> {
        self.loader.load_entity_files(entity)
    }

    /// Copy in files of an entity about to be inserted.
    pub async fn pre_persist<E: FileEntity + ?Sized>(&self, entity: &mut E) -> FilesResult<()> {
        self.updater.update_files(entity).await
    }

    /// Stage the files of an entity about to be deleted.
    pub async fn pre_remove<E: FileEntity + ?Sized>(&self, entity: &mut E) -> FilesResult<()> {
        self.remover.clear_entity_files(entity).await
    }

    /// Re-run the updater over every tracked entity.
    pub async fn pre_flush(&self, identity_map: &mut IdentityMap) -> FilesResult<()> {
        debug!(tracked = identity_map.len(), "Sweeping identity map");
        for entity in identity_map.iter_mut() {
            self.updater.update_files(entity).await?;
        }
        Ok(())
    }

    /// Delete everything staged since the last flush.
    pub async fn post_flush(&self) -> FilesResult<usize> {
        self.remover.flush().await
    }

    /// The remover owning the pending deletion set.
    #[must_use]
    pub fn remover(&self) -> &Arc<FileRemover> {
        &self.remover
    }
}
