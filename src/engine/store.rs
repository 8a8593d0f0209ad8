//! The item store
//!
//! [`ItemStore`] owns the primary map of items and keeps the view history and
//! the schedule consistent with it. Every mutation validates first and only
//! then touches the indexes, so a failed operation changes nothing.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use thiserror::Error;

use crate::domain::{
    EpicSummary, History, IdGenerator, Item, ItemError, ItemId, ItemKind, ItemStatus, Schedule,
    ScheduleError,
};

use super::record::ItemRecord;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Epic not found: {0}")]
    ParentNotFound(ItemId),

    #[error("Item {parent} is a {kind}, not an epic")]
    WrongParentKind { parent: ItemId, kind: ItemKind },

    #[error("Subtask {0} does not name an epic")]
    MissingEpic(ItemId),

    #[error("Item {id} has kind {actual}, expected {expected}")]
    KindMismatch {
        id: ItemId,
        expected: ItemKind,
        actual: ItemKind,
    },

    #[error("Item {id} overlaps scheduled item {conflicting}")]
    TimeConflict { id: ItemId, conflicting: ItemId },

    #[error("Status of epic {0} is derived from its subtasks and cannot be set")]
    IllegalStatusChange(ItemId),

    #[error("Duplicate item ID: {0}")]
    DuplicateId(ItemId),

    #[error("No item IDs left: {} is already in use", u32::MAX)]
    IdsExhausted,

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl From<ScheduleError> for StoreError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Overlap { id, conflicting } => StoreError::TimeConflict { id, conflicting },
        }
    }
}

impl From<ItemError> for StoreError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::NotAnEpic { parent, kind } => StoreError::WrongParentKind { parent, kind },
            other => StoreError::Validation(other.to_string()),
        }
    }
}

/// Tunables for a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Bound on the view history; None keeps every entry
    pub history_limit: Option<NonZeroUsize>,

    /// Longest accepted duration
    pub max_duration: Option<Duration>,
}

/// Request to create an item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    /// Required for subtasks, rejected otherwise
    pub epic: Option<ItemId>,
    pub start_time: Option<NaiveDateTime>,
    pub duration: Option<Duration>,
}

impl NewItem {
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: String::new(),
            epic: None,
            start_time: None,
            duration: None,
        }
    }

    pub fn task(name: impl Into<String>) -> Self {
        Self::new(ItemKind::Task, name)
    }

    pub fn epic(name: impl Into<String>) -> Self {
        Self::new(ItemKind::Epic, name)
    }

    pub fn subtask(epic: ItemId, name: impl Into<String>) -> Self {
        Self {
            epic: Some(epic),
            ..Self::new(ItemKind::Subtask, name)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn window(mut self, start_time: NaiveDateTime, duration: Duration) -> Self {
        self.start_time = Some(start_time);
        self.duration = Some(duration);
        self
    }
}

/// Full replacement of an existing item's editable fields
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub kind: ItemKind,
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// None keeps the current status; must be None for epics
    pub status: Option<ItemStatus>,
    pub start_time: Option<NaiveDateTime>,
    pub duration: Option<Duration>,
}

impl ItemUpdate {
    pub fn new(kind: ItemKind, id: ItemId, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: name.into(),
            description: String::new(),
            status: None,
            start_time: None,
            duration: None,
        }
    }

    /// Starts from the current values of `item`
    pub fn from_item(item: &Item) -> Self {
        Self {
            kind: item.kind(),
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            status: None,
            start_time: if item.is_epic() { None } else { item.start_time },
            duration: if item.is_epic() { None } else { item.duration },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn window(mut self, start_time: Option<NaiveDateTime>, duration: Option<Duration>) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }
}

/// Primary store plus its derived indexes
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: HashMap<ItemId, Item>,
    history: History,
    schedule: Schedule,
    ids: IdGenerator,
    options: StoreOptions,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            history: History::with_limit(options.history_limit),
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Creates an item with a fresh ID
    pub fn create(&mut self, new: NewItem) -> Result<Item, StoreError> {
        self.validate_fields(&new.name, new.start_time, new.duration)?;
        self.check_max_duration(new.duration)?;

        let id = self.ids.peek().ok_or(StoreError::IdsExhausted)?;
        let item = match new.kind {
            ItemKind::Task | ItemKind::Epic if new.epic.is_some() => {
                return Err(StoreError::Validation(format!(
                    "only subtasks belong to an epic, not a {}",
                    new.kind
                )));
            }
            ItemKind::Task => Item::task(id, new.name, new.description)
                .with_window(new.start_time, new.duration),
            ItemKind::Epic => {
                if new.start_time.is_some() || new.duration.is_some() {
                    debug!("Ignoring time window for new epic {}: it is derived", id);
                }
                Item::epic(id, new.name, new.description)
            }
            ItemKind::Subtask => {
                let epic_id = new.epic.ok_or(StoreError::MissingEpic(id))?;
                let epic = self
                    .items
                    .get(&epic_id)
                    .ok_or(StoreError::ParentNotFound(epic_id))?;
                Item::subtask(id, epic, new.name, new.description)?
                    .with_window(new.start_time, new.duration)
            }
        };

        self.admit(item.clone())?;
        debug!("Created {} {} '{}'", item.kind(), id, item.name);
        Ok(self.items.get(&id).cloned().unwrap_or(item))
    }

    /// Replaces the editable fields of an existing item
    ///
    /// Links are preserved: a subtask keeps its epic and an epic keeps its
    /// subtasks. Epic status and time window stay derived.
    pub fn update(&mut self, update: ItemUpdate) -> Result<Item, StoreError> {
        let current = self
            .items
            .get(&update.id)
            .ok_or(StoreError::NotFound(update.id))?;

        if current.kind() != update.kind {
            return Err(StoreError::KindMismatch {
                id: update.id,
                expected: update.kind,
                actual: current.kind(),
            });
        }
        if current.is_epic() && update.status.is_some() {
            return Err(StoreError::IllegalStatusChange(update.id));
        }
        self.validate_fields(&update.name, update.start_time, update.duration)?;
        self.check_max_duration(update.duration)?;

        let status = update.status.unwrap_or(current.status);
        let replacement = match current.kind() {
            ItemKind::Task => Item::task(update.id, update.name, update.description)
                .with_status(status)
                .with_window(update.start_time, update.duration),
            ItemKind::Epic => {
                let mut epic = current.clone();
                epic.rename(update.name, update.description);
                epic
            }
            ItemKind::Subtask => {
                let epic_id = current.epic_id().ok_or(StoreError::MissingEpic(update.id))?;
                let epic = self
                    .items
                    .get(&epic_id)
                    .ok_or(StoreError::ParentNotFound(epic_id))?;
                Item::subtask(update.id, epic, update.name, update.description)?
                    .with_status(status)
                    .with_window(update.start_time, update.duration)
            }
        };

        let epic_summary = match replacement.epic_id() {
            Some(epic_id) => Some((epic_id, self.summarize(epic_id, Some(&replacement))?)),
            None => None,
        };
        self.schedule.replace(replacement.id, replacement.slot())?;

        let id = replacement.id;
        self.items.insert(id, replacement);
        if let Some((epic_id, summary)) = epic_summary {
            self.apply_summary(epic_id, summary);
        }

        debug!("Updated item {}", id);
        self.items.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    /// Deletes an item; deleting an epic deletes its subtasks too
    ///
    /// Returns false if the item does not exist.
    pub fn delete(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.get(&id) else {
            return false;
        };

        match item.kind() {
            ItemKind::Task => {}
            ItemKind::Epic => {
                let subtasks: Vec<ItemId> = item.subtask_ids().collect();
                for subtask in &subtasks {
                    self.purge(*subtask);
                }
                info!("Deleted epic {} with {} subtask(s)", id, subtasks.len());
            }
            ItemKind::Subtask => {
                if let Some(epic_id) = item.epic_id() {
                    if let Some(epic) = self.items.get_mut(&epic_id) {
                        epic.detach_subtask(id);
                    }
                    self.refresh_epic(epic_id);
                }
            }
        }

        self.purge(id);
        debug!("Deleted item {}", id);
        true
    }

    /// Looks up an item without recording a view
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Records a view of `id` in the history
    pub fn record_view(&mut self, id: ItemId) -> Result<(), StoreError> {
        let item = self.items.get(&id).ok_or(StoreError::NotFound(id))?;
        self.history.touch(item);
        debug!("Recorded view of item {}", id);
        Ok(())
    }

    /// All items, ordered by ID
    pub fn list_all(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by_key(|item| item.id);
        items
    }

    /// Items of one kind, ordered by ID
    pub fn list_by_kind(&self, kind: ItemKind) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().filter(|i| i.kind() == kind).collect();
        items.sort_by_key(|item| item.id);
        items
    }

    /// Subtasks of an epic, ordered by ID
    pub fn subtasks_of(&self, epic_id: ItemId) -> Result<Vec<&Item>, StoreError> {
        let epic = self.items.get(&epic_id).ok_or(StoreError::NotFound(epic_id))?;
        if !epic.is_epic() {
            return Err(StoreError::WrongParentKind {
                parent: epic_id,
                kind: epic.kind(),
            });
        }
        Ok(epic
            .subtask_ids()
            .filter_map(|id| self.items.get(&id))
            .collect())
    }

    /// Snapshots of viewed items, oldest first
    pub fn list_history(&self) -> Vec<Item> {
        self.history.list()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Scheduled items ascending by start time, ties by ID
    pub fn list_schedule(&self) -> Vec<&Item> {
        self.schedule
            .ids()
            .filter_map(|id| self.items.get(&id))
            .collect()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Empties the store and its indexes and restarts IDs at 1
    pub fn clear_all(&mut self) {
        let removed = self.items.len();
        self.items.clear();
        self.history.clear();
        self.schedule.clear();
        self.ids.reset();
        info!("Cleared {} item(s)", removed);
    }

    /// Deletes every item of `kind`, returning how many items were removed
    ///
    /// Clearing epics also removes their subtasks, which are counted.
    pub fn clear_kind(&mut self, kind: ItemKind) -> usize {
        let before = self.items.len();
        let targets: Vec<ItemId> = self.list_by_kind(kind).iter().map(|i| i.id).collect();
        for id in targets {
            self.delete(id);
        }
        let removed = before - self.items.len();
        info!("Cleared {} item(s) while removing every {}", removed, kind);
        removed
    }

    /// Ordered dump of all items: epics first, then everything else by ID
    pub fn snapshot(&self) -> Vec<ItemRecord> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by_key(|item| (!item.is_epic(), item.id));
        items.into_iter().map(ItemRecord::from).collect()
    }

    /// Rebuilds a store from snapshot records
    ///
    /// Epics are replayed before subtasks whatever the record order. The ID
    /// generator continues after the highest ID seen.
    pub fn restore<I>(records: I, options: StoreOptions) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = ItemRecord>,
    {
        let mut records: Vec<ItemRecord> = records.into_iter().collect();
        records.sort_by_key(|record| (record.kind != ItemKind::Epic, record.id));

        let mut store = Self::with_options(options);
        for record in records {
            let duration = record.duration()?;
            // An epic's recorded window is derived and recomputed below
            if record.kind != ItemKind::Epic {
                store
                    .validate_fields(&record.name, record.start_time, duration)
                    .map_err(|err| match err {
                        StoreError::Validation(reason) => {
                            StoreError::Validation(format!("item {}: {}", record.id, reason))
                        }
                        other => other,
                    })?;
                if let Err(err) = store.check_max_duration(duration) {
                    warn!("Keeping item {} from the snapshot: {}", record.id, err);
                }
            } else {
                store.validate_fields(&record.name, None, None)?;
            }

            let item = match record.kind {
                ItemKind::Task => Item::task(record.id, record.name, record.description)
                    .with_status(record.status)
                    .with_window(record.start_time, duration),
                ItemKind::Epic => Item::epic(record.id, record.name, record.description),
                ItemKind::Subtask => {
                    let epic_id = record.epic.ok_or(StoreError::MissingEpic(record.id))?;
                    let epic = store
                        .items
                        .get(&epic_id)
                        .ok_or(StoreError::ParentNotFound(epic_id))?;
                    Item::subtask(record.id, epic, record.name, record.description)?
                        .with_status(record.status)
                        .with_window(record.start_time, duration)
                }
            };
            store.admit(item)?;
        }

        info!("Restored {} item(s)", store.items.len());
        Ok(store)
    }

    /// Replays recorded history snapshots, oldest first
    ///
    /// Entries for items that no longer exist are skipped. Returns the
    /// number of entries restored.
    pub fn restore_history<I>(&mut self, entries: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = ItemRecord>,
    {
        let mut restored = 0;
        for entry in entries {
            if !self.items.contains_key(&entry.id) {
                warn!("Skipping history entry for missing item {}", entry.id);
                continue;
            }
            self.history.touch(&entry.to_snapshot()?);
            restored += 1;
        }
        Ok(restored)
    }

    /// Adds a validated item to every index
    ///
    /// All fallible checks run before the first index is touched.
    fn admit(&mut self, item: Item) -> Result<(), StoreError> {
        if self.items.contains_key(&item.id) {
            return Err(StoreError::DuplicateId(item.id));
        }
        let epic_summary = match item.epic_id() {
            Some(epic_id) => Some((epic_id, self.summarize(epic_id, Some(&item))?)),
            None => None,
        };
        if let Some(slot) = item.slot() {
            self.schedule.insert(item.id, slot)?;
        }

        let id = item.id;
        self.ids.observe(id);
        self.items.insert(id, item);

        if let Some((epic_id, summary)) = epic_summary {
            if let Some(epic) = self.items.get_mut(&epic_id) {
                epic.attach_subtask(id);
            }
            self.apply_summary(epic_id, summary);
        }
        Ok(())
    }

    /// Removes an item from the primary map and both indexes
    fn purge(&mut self, id: ItemId) -> Option<Item> {
        self.schedule.remove(id);
        self.history.remove(id);
        self.items.remove(&id)
    }

    /// Summary of an epic as it would be with `changed` added or replaced
    fn summarize(&self, epic_id: ItemId, changed: Option<&Item>) -> Result<EpicSummary, StoreError> {
        let epic = self
            .items
            .get(&epic_id)
            .ok_or(StoreError::ParentNotFound(epic_id))?;
        let changed_id = changed.map(|item| item.id);
        let subtasks = epic
            .subtask_ids()
            .filter(|id| Some(*id) != changed_id)
            .filter_map(|id| self.items.get(&id))
            .chain(changed);

        EpicSummary::from_subtasks(subtasks).map_err(|err| {
            StoreError::Validation(format!("subtasks of epic {}: {}", epic_id, err))
        })
    }

    fn apply_summary(&mut self, epic_id: ItemId, summary: EpicSummary) {
        if let Some(epic) = self.items.get_mut(&epic_id) {
            if epic.status != summary.status {
                debug!("Epic {} is now {}", epic_id, summary.status);
            }
            epic.apply_summary(summary);
        }
    }

    /// Recomputes an epic's status and time window after a subtask left
    ///
    /// Removing a subtask only shrinks the duration total, so this cannot fail
    /// for a consistent store.
    fn refresh_epic(&mut self, epic_id: ItemId) {
        match self.summarize(epic_id, None) {
            Ok(summary) => self.apply_summary(epic_id, summary),
            Err(err) => warn!("Keeping previous summary of epic {}: {}", epic_id, err),
        }
    }

    fn validate_fields(
        &self,
        name: &str,
        start_time: Option<NaiveDateTime>,
        duration: Option<Duration>,
    ) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation("name must not be empty".to_string()));
        }
        if let Some(duration) = duration {
            if duration < Duration::zero() {
                return Err(StoreError::Validation(
                    "duration must not be negative".to_string(),
                ));
            }
            if let Some(start) = start_time {
                if start.checked_add_signed(duration).is_none() {
                    return Err(StoreError::Validation(format!(
                        "a {} minute window starting at {} ends past the last supported date",
                        duration.num_minutes(),
                        start
                    )));
                }
            }
        }
        Ok(())
    }

    /// Enforces the configured upper bound on durations
    fn check_max_duration(&self, duration: Option<Duration>) -> Result<(), StoreError> {
        match (duration, self.options.max_duration) {
            (Some(duration), Some(max)) if duration > max => Err(StoreError::Validation(format!(
                "duration of {} minutes exceeds the maximum of {} minutes",
                duration.num_minutes(),
                max.num_minutes()
            ))),
            _ => Ok(()),
        }
    }
}
