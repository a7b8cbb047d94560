// Snapshot storage shared by the refresher and request handlers.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::model::Snapshot;

/// SnapshotStore holds the current snapshot behind a read/write lock.
///
/// Readers clone the `Arc` under a shared lock and work on their copy without
/// holding it. The writer builds the next snapshot outside the store and only
/// swaps the pointer under the exclusive lock; the replaced snapshot is dropped
/// after the lock is released.
pub struct SnapshotStore<R> {
    current: RwLock<Arc<Snapshot<R>>>,
}

impl<R> SnapshotStore<R> {
    /// Creates a store holding the initial empty snapshot.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> Arc<Snapshot<R>> {
        self.current.read().clone()
    }

    /// Installs `records` as the current snapshot and returns it.
    pub fn replace(&self, records: Vec<R>) -> Arc<Snapshot<R>> {
        let refreshed_at = Utc::now();
        let (prev, next) = {
            let mut guard = self.current.write();
            let next = Arc::new(Snapshot::new(guard.version() + 1, records, refreshed_at));
            (std::mem::replace(&mut *guard, next.clone()), next)
        };
        drop(prev);
        next
    }

    /// Returns the version of the current snapshot.
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }
}

impl<R> Default for SnapshotStore<R> {
    fn default() -> Self {
        Self::new()
    }
}
