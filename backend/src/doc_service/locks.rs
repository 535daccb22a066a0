use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Per-document mutual exclusion for the read → substitute → commit →
/// register sequence.
///
/// Cloning shares the same table. Entries are dropped once no caller holds or
/// waits for them, so the table only grows with the number of documents
/// being worked on concurrently.
#[derive(Clone, Default)]
pub struct DocumentLocks {
    slots: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `id`.
    pub fn run<T>(&self, id: Uuid, f: impl FnOnce() -> T) -> T {
        let slot = Arc::clone(self.table().entry(id).or_default());

        let result = {
            let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        drop(slot);
        let mut table = self.table();
        // New waiters clone under the table lock, so a count of one (the
        // table's own) means nobody holds or awaits this slot.
        if table.get(&id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            table.remove(&id);
        }
        result
    }

    /// Number of documents with a held or awaited lock.
    pub fn active(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Mutex<()>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
