//! Entity Store - deduplicated in-memory entity collection
//!
//! One store per entity kind (messages, conversations). Entities are keyed
//! by id; upserting an already-known id overlays the new payload field-wise
//! onto the stored one instead of replacing it, so a summary fetch never
//! erases an already-fetched body.

use crate::models::CacheEntity;

/// In-memory deduplicated collection of cache entities.
#[derive(Debug, Default)]
pub struct EntityStore<T: CacheEntity> {
    entries: Vec<T>,
}

impl<T: CacheEntity> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or merge a batch of entities. Known ids are overlaid
    /// field-wise, unknown ids are appended.
    pub fn upsert(&mut self, entities: Vec<T>) {
        for entity in entities {
            match self.entries.iter_mut().find(|e| e.id() == entity.id()) {
                Some(current) => current.merge_from(entity),
                None => self.entries.push(entity),
            }
        }
    }

    /// Replace a stored entity wholesale, bypassing the field-wise merge.
    /// For callers that already hold the complete next state, such as a
    /// patched entity whose label set may legitimately have become empty.
    pub fn replace(&mut self, entity: T) {
        match self.entries.iter_mut().find(|e| e.id() == entity.id()) {
            Some(current) => *current = entity,
            None => self.entries.push(entity),
        }
    }

    /// Remove every entity satisfying the predicate; returns how many were
    /// removed. Removing nothing is a no-op.
    pub fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|e| !predicate(e));
        before - self.entries.len()
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Borrowing filter over the stored entities.
    pub fn filter<F>(&self, predicate: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.entries.iter().filter(|e| predicate(e)).collect()
    }

    /// Defensive copies: callers must not observe later mutations.
    pub fn copy_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Sort entities most-recent-first. Every list handed back to a caller goes
/// through this.
pub fn order<T: CacheEntity>(mut entities: Vec<T>) -> Vec<T> {
    entities.sort_by(|a, b| b.time().cmp(&a.time()));
    entities
}
