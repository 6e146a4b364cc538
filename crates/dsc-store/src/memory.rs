//! In-memory reference implementation of [`Repository`].
//!
//! This adapter is deterministic and test-friendly: listing order is
//! creation time, then id.

use crate::traits::{Mutation, QueryWindow, Repository};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use dsc_types::Entity;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

pub struct InMemoryRepository<T> {
    records: RwLock<HashMap<Uuid, T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T: Entity>() -> StorageError {
    StorageError::Backend(format!("{} lock poisoned", T::KIND))
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn get(&self, id: Uuid) -> StorageResult<Option<T>> {
        let guard = self.records.read().map_err(|_| poisoned::<T>())?;
        Ok(guard.get(&id).filter(|r| !r.is_deleted()).cloned())
    }

    async fn get_including_deleted(&self, id: Uuid) -> StorageResult<Option<T>> {
        let guard = self.records.read().map_err(|_| poisoned::<T>())?;
        Ok(guard.get(&id).cloned())
    }

    async fn exists(&self, id: Uuid) -> StorageResult<bool> {
        let guard = self.records.read().map_err(|_| poisoned::<T>())?;
        Ok(guard.get(&id).map_or(false, |r| !r.is_deleted()))
    }

    async fn missing(&self, ids: &[Uuid]) -> StorageResult<Vec<Uuid>> {
        let guard = self.records.read().map_err(|_| poisoned::<T>())?;
        Ok(ids
            .iter()
            .filter(|id| guard.get(id).map_or(true, |r| r.is_deleted()))
            .copied()
            .collect())
    }

    async fn get_many(&self, ids: &[Uuid]) -> StorageResult<Vec<T>> {
        let guard = self.records.read().map_err(|_| poisoned::<T>())?;
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id))
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect())
    }

    async fn save(&self, mut entity: T) -> StorageResult<T> {
        entity.touch();
        let mut guard = self.records.write().map_err(|_| poisoned::<T>())?;
        guard.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn list(&self, window: QueryWindow) -> StorageResult<Vec<T>> {
        let guard = self.records.read().map_err(|_| poisoned::<T>())?;
        let mut values = guard
            .values()
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| {
            a.meta()
                .created_at
                .cmp(&b.meta().created_at)
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(window.apply(values))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let mut guard = self.records.write().map_err(|_| poisoned::<T>())?;
        match guard.get_mut(&id) {
            Some(record) if !record.is_deleted() => {
                record.mark_deleted();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn modify(&self, id: Uuid, mutation: Mutation<T>) -> StorageResult<T> {
        let mut guard = self.records.write().map_err(|_| poisoned::<T>())?;
        let current = guard
            .get(&id)
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| StorageError::NotFound(format!("{} {id}", T::KIND)))?;

        // Work on a copy so a failing mutation leaves the stored record intact.
        let mut updated = current.clone();
        mutation(&mut updated)?;
        updated.touch();
        guard.insert(id, updated.clone());
        Ok(updated)
    }
}
