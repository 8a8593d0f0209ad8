//! Flat item records for snapshots
//!
//! A record carries everything needed to rebuild the primary store and the
//! epic/subtask links: subtask sets are not stored, they are rebuilt from
//! each subtask's `epic` field on reload.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{Hierarchy, Item, ItemId, ItemKind, ItemStatus};

use super::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,

    pub kind: ItemKind,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ItemStatus,

    /// Owning epic, for subtasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<ItemId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

impl ItemRecord {
    /// The duration as a time span
    pub fn duration(&self) -> Result<Option<Duration>, StoreError> {
        self.duration_minutes
            .map(|minutes| {
                Duration::try_minutes(minutes).ok_or_else(|| {
                    StoreError::Validation(format!(
                        "duration of item {} is out of range: {} minutes",
                        self.id, minutes
                    ))
                })
            })
            .transpose()
    }

    /// Rebuilds a detached copy of the recorded item
    ///
    /// Used for history entries, which are snapshots and never consulted for
    /// links; an epic copy therefore has an empty subtask set.
    pub fn to_snapshot(&self) -> Result<Item, StoreError> {
        let hierarchy = match self.kind {
            ItemKind::Task => Hierarchy::Task,
            ItemKind::Epic => Hierarchy::Epic {
                subtasks: Default::default(),
                end_time: None,
            },
            ItemKind::Subtask => Hierarchy::Subtask {
                epic: self.epic.ok_or(StoreError::MissingEpic(self.id))?,
            },
        };

        Ok(Item::from_parts(
            self.id,
            self.name.clone(),
            self.description.clone(),
            self.status,
            self.start_time,
            self.duration()?,
            hierarchy,
        ))
    }
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            kind: item.kind(),
            name: item.name.clone(),
            description: item.description.clone(),
            status: item.status,
            epic: item.epic_id(),
            start_time: item.start_time,
            duration_minutes: item.duration.map(|d| d.num_minutes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn id(value: u32) -> ItemId {
        ItemId::new(value).unwrap()
    }

    #[test]
    fn record_from_subtask() {
        let epic = Item::epic(id(1), "Move", "");
        let start = NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let subtask = Item::subtask(id(2), &epic, "Pack boxes", "All of them")
            .unwrap()
            .with_window(Some(start), Some(Duration::minutes(60)));

        let record = ItemRecord::from(&subtask);
        assert_eq!(record.kind, ItemKind::Subtask);
        assert_eq!(record.epic, Some(id(1)));
        assert_eq!(record.duration_minutes, Some(60));

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""kind":"subtask""#));
        assert!(json.contains(r#""start_time":"2025-05-14T09:30:00""#));
    }

    #[test]
    fn minimal_record_uses_defaults() {
        let record: ItemRecord =
            serde_json::from_str(r#"{"id":3,"kind":"task","name":"Tea"}"#).unwrap();
        assert_eq!(record.status, ItemStatus::New);
        assert_eq!(record.description, "");
        assert!(record.epic.is_none());
        assert_eq!(record.duration().unwrap(), None);
    }

    #[test]
    fn snapshot_of_subtask_requires_epic() {
        let record = ItemRecord {
            id: id(4),
            kind: ItemKind::Subtask,
            name: "Orphan".to_string(),
            description: String::new(),
            status: ItemStatus::New,
            epic: None,
            start_time: None,
            duration_minutes: None,
        };
        assert_eq!(record.to_snapshot().unwrap_err(), StoreError::MissingEpic(id(4)));
    }

    #[test]
    fn out_of_range_duration_is_rejected() {
        let record = ItemRecord {
            id: id(5),
            kind: ItemKind::Task,
            name: "Forever".to_string(),
            description: String::new(),
            status: ItemStatus::New,
            epic: None,
            start_time: None,
            duration_minutes: Some(i64::MAX),
        };
        assert!(matches!(record.duration(), Err(StoreError::Validation(_))));
    }
}
