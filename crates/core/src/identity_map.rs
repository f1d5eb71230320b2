//! Tracked entity instances of one unit of work.

use std::fmt;

use crate::entity::FileEntity;

/// Handle of a tracked entity, unique within one identity map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Persistence state of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Loaded from, or already written to, the database.
    Managed,
    /// Scheduled for insertion on the next flush.
    New,
    /// Scheduled for deletion on the next flush.
    Removed,
}

struct Tracked {
    id: EntityId,
    state: EntityState,
    entity: Box<dyn FileEntity>,
}

/// Entity instances grouped by entity type, in insertion order.
#[derive(Default)]
pub struct IdentityMap {
    types: Vec<(String, Vec<Tracked>)>,
    next_id: u64,
}

impl IdentityMap {
    /// Create an empty identity map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an entity.
    pub fn insert(&mut self, entity: Box<dyn FileEntity>, state: EntityState) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let entity_type = entity.entity_type().to_string();
        let tracked = Tracked { id, state, entity };
        match self.types.iter_mut().find(|(name, _)| *name == entity_type) {
            Some((_, instances)) => instances.push(tracked),
            None => self.types.push((entity_type, vec![tracked])),
        }
        id
    }

    /// Stop tracking an entity and hand it back.
    pub fn detach(&mut self, id: EntityId) -> Option<Box<dyn FileEntity>> {
        for (_, instances) in &mut self.types {
            if let Some(index) = instances.iter().position(|t| t.id == id) {
                return Some(instances.remove(index).entity);
            }
        }
        None
    }

    /// Mutable access to a tracked entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn FileEntity + 'static)> {
        self.find_mut(id).map(|t| t.entity.as_mut())
    }

    /// State of a tracked entity.
    #[must_use]
    pub fn state(&self, id: EntityId) -> Option<EntityState> {
        self.tracked().find(|t| t.id == id).map(|t| t.state)
    }

    /// Change the state of a tracked entity. Returns `false` if not tracked.
    pub fn set_state(&mut self, id: EntityId, state: EntityState) -> bool {
        match self.find_mut(id) {
            Some(tracked) => {
                tracked.state = state;
                true
            }
            None => false,
        }
    }

    /// Ids in the given state, grouped by type in insertion order.
    #[must_use]
    pub fn ids_in_state(&self, state: EntityState) -> Vec<EntityId> {
        self.tracked()
            .filter(|t| t.state == state)
            .map(|t| t.id)
            .collect()
    }

    /// Every tracked entity, all types, all instances.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn FileEntity + 'static)> + '_ {
        self.types
            .iter_mut()
            .flat_map(|(_, instances)| instances.iter_mut())
            .map(|t| t.entity.as_mut())
    }

    /// Entity types in first-seen order.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(name, _)| name.as_str())
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.iter().map(|(_, instances)| instances.len()).sum()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tracked(&self) -> impl Iterator<Item = &Tracked> {
        self.types.iter().flat_map(|(_, instances)| instances.iter())
    }

    fn find_mut(&mut self, id: EntityId) -> Option<&mut Tracked> {
        self.types
            .iter_mut()
            .flat_map(|(_, instances)| instances.iter_mut())
            .find(|t| t.id == id)
    }
}

impl fmt::Debug for IdentityMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, instances) in &self.types {
            map.entry(name, &instances.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_support::{Comment, Document};

    #[test]
    fn test_groups_by_type_in_insertion_order() {
        let mut map = IdentityMap::new();
        map.insert(Box::new(Comment), EntityState::Managed);
        map.insert(Box::new(Document::default()), EntityState::New);
        map.insert(Box::new(Comment), EntityState::Managed);

        assert_eq!(map.entity_types().collect::<Vec<_>>(), ["comment", "document"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.iter_mut().count(), 3);
    }

    #[test]
    fn test_state_transitions() {
        let mut map = IdentityMap::new();
        let id = map.insert(Box::new(Document::default()), EntityState::New);

        assert_eq!(map.state(id), Some(EntityState::New));
        assert!(map.set_state(id, EntityState::Removed));
        assert_eq!(map.ids_in_state(EntityState::Removed), [id]);
        assert!(map.ids_in_state(EntityState::New).is_empty());
    }

    #[test]
    fn test_detach() {
        let mut map = IdentityMap::new();
        let id = map.insert(Box::new(Document::default()), EntityState::Managed);

        let entity = map.detach(id).unwrap();
        assert_eq!(entity.entity_type(), "document");
        assert!(map.is_empty());
        assert!(map.detach(id).is_none());
        assert!(map.get_mut(id).is_none());
        assert!(!map.set_state(id, EntityState::Managed));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut map = IdentityMap::new();
        let a = map.insert(Box::new(Comment), EntityState::Managed);
        map.detach(a);
        let b = map.insert(Box::new(Comment), EntityState::Managed);
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "#1");
    }
}
