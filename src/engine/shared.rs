//! Thread-safe handle to an [`ItemStore`]
//!
//! Every call takes the lock for exactly one store operation, so a call is
//! atomic with respect to the others. Reads return owned copies.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{Item, ItemId, ItemKind};

use super::store::{ItemStore, ItemUpdate, NewItem, StoreError};

#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<ItemStore>>,
}

impl SharedStore {
    pub fn new(store: ItemStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    // Mutations validate before touching any index, so a poisoned store is
    // still consistent.
    fn read(&self) -> RwLockReadGuard<'_, ItemStore> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ItemStore> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, new: NewItem) -> Result<Item, StoreError> {
        self.write().create(new)
    }

    pub fn update(&self, update: ItemUpdate) -> Result<Item, StoreError> {
        self.write().update(update)
    }

    pub fn delete(&self, id: ItemId) -> bool {
        self.write().delete(id)
    }

    pub fn get(&self, id: ItemId) -> Option<Item> {
        self.read().get(id).cloned()
    }

    /// Looks up an item and records the view in one step
    pub fn view(&self, id: ItemId) -> Result<Item, StoreError> {
        let mut store = self.write();
        store.record_view(id)?;
        store.get(id).cloned().ok_or(StoreError::NotFound(id))
    }

    pub fn list_all(&self) -> Vec<Item> {
        self.read().list_all().into_iter().cloned().collect()
    }

    pub fn list_by_kind(&self, kind: ItemKind) -> Vec<Item> {
        self.read().list_by_kind(kind).into_iter().cloned().collect()
    }

    pub fn subtasks_of(&self, epic_id: ItemId) -> Result<Vec<Item>, StoreError> {
        Ok(self
            .read()
            .subtasks_of(epic_id)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn list_history(&self) -> Vec<Item> {
        self.read().list_history()
    }

    pub fn list_schedule(&self) -> Vec<Item> {
        self.read().list_schedule().into_iter().cloned().collect()
    }

    pub fn clear_all(&self) {
        self.write().clear_all();
    }

    pub fn clear_kind(&self, kind: ItemKind) -> usize {
        self.write().clear_kind(kind)
    }
}

impl From<ItemStore> for SharedStore {
    fn from(store: ItemStore) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::thread;

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let shared = SharedStore::default();
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|i| shared.create(NewItem::task(format!("T{}-{}", n, i))).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<ItemId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(shared.list_all().len(), 200);
    }

    #[test]
    fn concurrent_scheduling_never_overlaps() {
        let shared = SharedStore::default();
        let start = NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for offset in 0..10 {
                        let at = start + Duration::minutes(offset * 15 + n);
                        let _ = shared.create(
                            NewItem::task(format!("T{}", n)).window(at, Duration::minutes(20)),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let scheduled = shared.list_schedule();
        for pair in scheduled.windows(2) {
            assert!(pair[0].end_time().unwrap() <= pair[1].start_time.unwrap());
        }
    }

    #[test]
    fn rejected_create_leaves_lock_usable() {
        let shared = SharedStore::default();
        let epic_id = shared.create(NewItem::epic("Move")).unwrap().id;
        let huge = Duration::try_minutes(150_000_000_000_000).unwrap();
        let oversized = move |name: &str| NewItem {
            duration: Some(huge),
            ..NewItem::subtask(epic_id, name)
        };

        shared.create(oversized("First")).unwrap();
        let worker = shared.clone();
        let result = thread::spawn(move || worker.create(oversized("Second")))
            .join()
            .unwrap();
        assert!(matches!(result, Err(StoreError::Validation(_))));

        assert!(!shared.inner.is_poisoned());
        assert_eq!(shared.subtasks_of(epic_id).unwrap().len(), 1);
        assert!(shared.create(NewItem::task("Tea")).is_ok());
    }

    #[test]
    fn view_records_history() {
        let shared = SharedStore::default();
        let task = shared.create(NewItem::task("Tea")).unwrap();
        assert!(shared.get(task.id).is_some());
        assert!(shared.list_history().is_empty());

        assert_eq!(shared.view(task.id).unwrap().name, "Tea");
        assert_eq!(shared.list_history().len(), 1);
    }
}
