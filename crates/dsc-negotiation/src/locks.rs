use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

/// One async mutex per record id.
///
/// Negotiations lock the artifacts they target and confirmations lock the
/// agreement they flip. Keys are locked in ascending order so overlapping
/// lock sets cannot deadlock. An entry lives only while someone holds or
/// waits for it.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Arc<LockMap>,
}

/// Holds one key of a [`KeyedLocks`]. Dropping it releases the key and
/// forgets the mutex when nobody else is queued on it.
pub struct KeyGuard {
    key: Uuid,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone of the mutex, so only the map's own reference
        // may be left.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: Uuid) -> KeyGuard {
        let mutex = self.locks.entry(key).or_default().clone();
        let mut held = KeyGuard {
            key,
            locks: self.locks.clone(),
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Lock every key in `keys`, ascending, skipping duplicates.
    pub async fn lock_all(&self, keys: &[Uuid]) -> Vec<KeyGuard> {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
