use crate::StorageResult;
use async_trait::async_trait;
use dsc_types::Entity;
use uuid::Uuid;

/// Generic query window for paged reads. A zero limit means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(offset: usize, limit: usize) -> Self {
        Self { limit, offset }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        if self.limit == 0 {
            iter.collect()
        } else {
            iter.take(self.limit).collect()
        }
    }
}

/// In-place change applied atomically by [`Repository::modify`]. Returning an
/// error aborts the change.
pub type Mutation<T> = Box<dyn FnOnce(&mut T) -> StorageResult<()> + Send>;

/// Storage interface for one record type.
///
/// Soft-deleted records are invisible to every read except
/// [`Repository::get_including_deleted`].
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Get one live record by id.
    async fn get(&self, id: Uuid) -> StorageResult<Option<T>>;

    /// Get one record by id, soft-deleted or not.
    async fn get_including_deleted(&self, id: Uuid) -> StorageResult<Option<T>>;

    async fn exists(&self, id: Uuid) -> StorageResult<bool>;

    /// Ids from `ids` that do not name a live record, in input order.
    async fn missing(&self, ids: &[Uuid]) -> StorageResult<Vec<Uuid>>;

    /// Live records for `ids`, in input order. Unknown ids are skipped.
    async fn get_many(&self, ids: &[Uuid]) -> StorageResult<Vec<T>>;

    /// Insert or replace a record.
    async fn save(&self, entity: T) -> StorageResult<T>;

    /// List live records oldest-first.
    async fn list(&self, window: QueryWindow) -> StorageResult<Vec<T>>;

    /// Soft-delete a record. Returns false if it was not live.
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;

    /// Apply `mutation` to a live record under the repository's write lock
    /// and persist the result. Fails `NotFound` for unknown ids.
    async fn modify(&self, id: Uuid, mutation: Mutation<T>) -> StorageResult<T>;
}
