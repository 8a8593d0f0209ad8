//! Work item domain model
//!
//! An item is a plain task, an epic that groups subtasks, or a subtask that
//! belongs to exactly one epic. Epics never carry their own status or time
//! window: both are summarised from their subtasks by [`EpicSummary`].
//!
//! Items only reference each other by [`ItemId`]; the store owns every item.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use super::id::ItemId;
use super::schedule::TimeSlot;

#[derive(Debug, Error, PartialEq)]
pub enum ItemError {
    #[error("Unknown status '{0}': expected new, in_progress or done")]
    UnknownStatus(String),

    #[error("Unknown item kind '{0}': expected task, epic or subtask")]
    UnknownKind(String),

    #[error("Item {parent} is a {kind}, not an epic")]
    NotAnEpic { parent: ItemId, kind: ItemKind },

    #[error("Total duration of the subtasks is out of range")]
    DurationOverflow,
}

/// Progress of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    New,
    InProgress,
    Done,
}

impl ItemStatus {
    /// Summarises subtask statuses into an epic status
    ///
    /// No subtasks or all `New` gives `New`, all `Done` gives `Done`; any
    /// `InProgress` or any disagreement gives `InProgress`.
    pub fn aggregate<I>(statuses: I) -> ItemStatus
    where
        I: IntoIterator<Item = ItemStatus>,
    {
        let mut statuses = statuses.into_iter();
        let Some(first) = statuses.next() else {
            return ItemStatus::New;
        };

        let mut uniform = true;
        let mut any_in_progress = first == ItemStatus::InProgress;
        for status in statuses {
            uniform &= status == first;
            any_in_progress |= status == ItemStatus::InProgress;
        }

        if any_in_progress || !uniform {
            ItemStatus::InProgress
        } else {
            first
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::New => "new",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Done => "done",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "new" => Ok(ItemStatus::New),
            "in_progress" => Ok(ItemStatus::InProgress),
            "done" => Ok(ItemStatus::Done),
            _ => Err(ItemError::UnknownStatus(s.to_string())),
        }
    }
}

/// Discriminator for the three item variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Task,
    Epic,
    Subtask,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Task => "task",
            ItemKind::Epic => "epic",
            ItemKind::Subtask => "subtask",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" => Ok(ItemKind::Task),
            "epic" => Ok(ItemKind::Epic),
            "subtask" => Ok(ItemKind::Subtask),
            _ => Err(ItemError::UnknownKind(s.to_string())),
        }
    }
}

/// Variant-specific links of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hierarchy {
    Task,
    Epic {
        subtasks: BTreeSet<ItemId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_time: Option<NaiveDateTime>,
    },
    Subtask {
        epic: ItemId,
    },
}

/// A work item
///
/// Equality and hashing only look at the ID.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,

    pub name: String,

    pub description: String,

    /// Settable for tasks and subtasks, derived for epics
    pub status: ItemStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,

    #[serde(
        rename = "duration_minutes",
        serialize_with = "serialize_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,

    #[serde(flatten)]
    hierarchy: Hierarchy,
}

fn serialize_minutes<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(duration) => serializer.serialize_some(&duration.num_minutes()),
        None => serializer.serialize_none(),
    }
}

impl Item {
    /// Creates a plain task
    pub fn task(id: ItemId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_hierarchy(id, name, description, Hierarchy::Task)
    }

    /// Creates an epic with no subtasks
    pub fn epic(id: ItemId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_hierarchy(
            id,
            name,
            description,
            Hierarchy::Epic {
                subtasks: BTreeSet::new(),
                end_time: None,
            },
        )
    }

    /// Creates a subtask of `epic`
    ///
    /// Fails if `epic` is not an epic. The epic itself is not modified; the
    /// store attaches the subtask once it has been accepted.
    pub fn subtask(
        id: ItemId,
        epic: &Item,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ItemError> {
        if !epic.is_epic() {
            return Err(ItemError::NotAnEpic {
                parent: epic.id,
                kind: epic.kind(),
            });
        }
        Ok(Self::with_hierarchy(
            id,
            name,
            description,
            Hierarchy::Subtask { epic: epic.id },
        ))
    }

    /// Assembles an item from stored fields without checking links
    pub(crate) fn from_parts(
        id: ItemId,
        name: String,
        description: String,
        status: ItemStatus,
        start_time: Option<NaiveDateTime>,
        duration: Option<Duration>,
        hierarchy: Hierarchy,
    ) -> Self {
        Self {
            id,
            name,
            description,
            status,
            start_time,
            duration,
            hierarchy,
        }
    }

    fn with_hierarchy(
        id: ItemId,
        name: impl Into<String>,
        description: impl Into<String>,
        hierarchy: Hierarchy,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            status: ItemStatus::New,
            start_time: None,
            duration: None,
            hierarchy,
        }
    }

    /// Sets the status (ignored for epics, whose status is derived)
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        if !self.is_epic() {
            self.status = status;
        }
        self
    }

    /// Sets the time window (ignored for epics, whose window is derived)
    pub fn with_window(mut self, start_time: Option<NaiveDateTime>, duration: Option<Duration>) -> Self {
        if !self.is_epic() {
            self.start_time = start_time;
            self.duration = duration;
        }
        self
    }

    pub fn kind(&self) -> ItemKind {
        match self.hierarchy {
            Hierarchy::Task => ItemKind::Task,
            Hierarchy::Epic { .. } => ItemKind::Epic,
            Hierarchy::Subtask { .. } => ItemKind::Subtask,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn is_epic(&self) -> bool {
        matches!(self.hierarchy, Hierarchy::Epic { .. })
    }

    /// The epic a subtask belongs to
    pub fn epic_id(&self) -> Option<ItemId> {
        match self.hierarchy {
            Hierarchy::Subtask { epic } => Some(epic),
            _ => None,
        }
    }

    /// Subtask IDs of an epic (empty for other kinds)
    pub fn subtask_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        let subtasks = match &self.hierarchy {
            Hierarchy::Epic { subtasks, .. } => Some(subtasks),
            _ => None,
        };
        subtasks.into_iter().flatten().copied()
    }

    /// End of the time window
    ///
    /// For epics this is the latest subtask end, not `start + duration`.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        match &self.hierarchy {
            Hierarchy::Epic { end_time, .. } => *end_time,
            _ => self
                .start_time
                .zip(self.duration)
                .and_then(|(start, duration)| start.checked_add_signed(duration)),
        }
    }

    /// The slot this item occupies in the schedule, if any
    ///
    /// Epics, unscheduled items and items without a positive duration have
    /// no slot.
    pub fn slot(&self) -> Option<TimeSlot> {
        if self.is_epic() {
            return None;
        }
        let start = self.start_time?;
        let duration = self.duration.filter(|d| *d > Duration::zero())?;
        TimeSlot::new(start, duration)
    }

    pub(crate) fn attach_subtask(&mut self, subtask: ItemId) {
        if let Hierarchy::Epic { subtasks, .. } = &mut self.hierarchy {
            subtasks.insert(subtask);
        }
    }

    pub(crate) fn detach_subtask(&mut self, subtask: ItemId) -> bool {
        match &mut self.hierarchy {
            Hierarchy::Epic { subtasks, .. } => subtasks.remove(&subtask),
            _ => false,
        }
    }

    /// Overwrites the derived fields of an epic
    pub(crate) fn apply_summary(&mut self, summary: EpicSummary) {
        if let Hierarchy::Epic { end_time, .. } = &mut self.hierarchy {
            self.status = summary.status;
            self.start_time = summary.start_time;
            self.duration = summary.duration;
            *end_time = summary.end_time;
        }
    }

    /// Replaces name and description, keeping links and derived state
    pub(crate) fn rename(&mut self, name: String, description: String) {
        self.name = name;
        self.description = description;
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Derived status and time window of an epic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpicSummary {
    pub status: ItemStatus,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    /// Sum of subtask durations, missing durations counting as zero
    pub duration: Option<Duration>,
}

impl EpicSummary {
    pub fn from_subtasks<'a, I>(subtasks: I) -> Result<Self, ItemError>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let subtasks: Vec<&Item> = subtasks.into_iter().collect();
        if subtasks.is_empty() {
            return Ok(Self::default());
        }

        let duration = subtasks
            .iter()
            .filter_map(|s| s.duration)
            .try_fold(Duration::zero(), |total, d| total.checked_add(&d))
            .ok_or(ItemError::DurationOverflow)?;

        Ok(Self {
            status: ItemStatus::aggregate(subtasks.iter().map(|s| s.status)),
            start_time: subtasks.iter().filter_map(|s| s.start_time).min(),
            end_time: subtasks.iter().filter_map(|s| s.end_time()).max(),
            duration: Some(duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use ItemStatus::{Done, InProgress, New};

    fn id(value: u32) -> ItemId {
        ItemId::new(value).unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn aggregate_rule_table() {
        assert_eq!(ItemStatus::aggregate(Vec::<ItemStatus>::new()), New);
        assert_eq!(ItemStatus::aggregate([New, New]), New);
        assert_eq!(ItemStatus::aggregate([Done, Done, Done]), Done);
        assert_eq!(ItemStatus::aggregate([New, Done]), InProgress);
        assert_eq!(ItemStatus::aggregate([Done, InProgress]), InProgress);
        assert_eq!(ItemStatus::aggregate([InProgress]), InProgress);
    }

    #[test]
    fn status_parse_and_display() {
        assert_eq!("in-progress".parse::<ItemStatus>().unwrap(), InProgress);
        assert_eq!("DONE".parse::<ItemStatus>().unwrap(), Done);
        assert_eq!(InProgress.to_string(), "in_progress");
        assert!("later".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn kind_parse() {
        assert_eq!("Epic".parse::<ItemKind>().unwrap(), ItemKind::Epic);
        assert!(matches!(
            "story".parse::<ItemKind>(),
            Err(ItemError::UnknownKind(_))
        ));
    }

    #[test]
    fn subtask_requires_epic_parent() {
        let task = Item::task(id(1), "Boil water", "");
        let err = Item::subtask(id(2), &task, "Pour", "").unwrap_err();
        assert_eq!(
            err,
            ItemError::NotAnEpic {
                parent: id(1),
                kind: ItemKind::Task
            }
        );

        let epic = Item::epic(id(3), "Move", "");
        let subtask = Item::subtask(id(4), &epic, "Pack boxes", "").unwrap();
        assert_eq!(subtask.epic_id(), Some(id(3)));
        assert_eq!(subtask.kind(), ItemKind::Subtask);
    }

    #[test]
    fn equality_is_by_id() {
        let a = Item::task(id(1), "A", "first");
        let b = Item::task(id(1), "B", "second").with_status(Done);
        assert_eq!(a, b);
        assert_ne!(a, Item::task(id(2), "A", "first"));
    }

    #[test]
    fn epic_ignores_direct_status_and_window() {
        let epic = Item::epic(id(1), "Move", "")
            .with_status(Done)
            .with_window(Some(at(9, 0)), Some(Duration::minutes(30)));
        assert_eq!(epic.status, New);
        assert!(epic.start_time.is_none());
        assert!(epic.slot().is_none());
    }

    #[test]
    fn slot_requires_start_and_positive_duration() {
        let base = Item::task(id(1), "Tea", "");
        assert!(base.clone().slot().is_none());
        assert!(base
            .clone()
            .with_window(Some(at(11, 0)), Some(Duration::zero()))
            .slot()
            .is_none());
        assert!(base
            .clone()
            .with_window(None, Some(Duration::minutes(5)))
            .slot()
            .is_none());

        let scheduled = base.with_window(Some(at(11, 0)), Some(Duration::minutes(10)));
        let slot = scheduled.slot().unwrap();
        assert_eq!(slot.start(), at(11, 0));
        assert_eq!(slot.end(), at(11, 10));
        assert_eq!(scheduled.end_time(), Some(at(11, 10)));
    }

    #[test]
    fn epic_summary_from_subtasks() {
        let epic = Item::epic(id(1), "Move", "");
        let pack = Item::subtask(id(2), &epic, "Pack boxes", "")
            .unwrap()
            .with_window(Some(at(9, 30)), Some(Duration::minutes(60)));
        let cat = Item::subtask(id(3), &epic, "Pack the cat", "")
            .unwrap()
            .with_status(Done)
            .with_window(Some(at(10, 30)), Some(Duration::minutes(30)));
        let loose = Item::subtask(id(4), &epic, "Say goodbye", "").unwrap();

        let summary = EpicSummary::from_subtasks([&pack, &cat, &loose]).unwrap();
        assert_eq!(summary.status, InProgress);
        assert_eq!(summary.start_time, Some(at(9, 30)));
        assert_eq!(summary.end_time, Some(at(11, 0)));
        assert_eq!(summary.duration, Some(Duration::minutes(90)));
    }

    #[test]
    fn empty_epic_summary_has_no_window() {
        let summary = EpicSummary::from_subtasks(std::iter::empty()).unwrap();
        assert_eq!(summary.status, New);
        assert!(summary.start_time.is_none());
        assert!(summary.end_time.is_none());
        assert!(summary.duration.is_none());
    }

    #[test]
    fn epic_summary_reports_duration_overflow() {
        let epic = Item::epic(id(1), "Move", "");
        let huge = Duration::try_minutes(150_000_000_000_000).unwrap();
        let first = Item::subtask(id(2), &epic, "First", "")
            .unwrap()
            .with_window(None, Some(huge));
        let second = Item::subtask(id(3), &epic, "Second", "")
            .unwrap()
            .with_window(None, Some(huge));

        assert!(EpicSummary::from_subtasks([&first]).is_ok());
        assert_eq!(
            EpicSummary::from_subtasks([&first, &second]),
            Err(ItemError::DurationOverflow)
        );
    }

    #[test]
    fn apply_summary_updates_epic_only() {
        let mut epic = Item::epic(id(1), "Move", "");
        epic.attach_subtask(id(2));
        epic.apply_summary(EpicSummary {
            status: Done,
            start_time: Some(at(9, 0)),
            end_time: Some(at(10, 0)),
            duration: Some(Duration::minutes(60)),
        });
        assert_eq!(epic.status, Done);
        assert_eq!(epic.end_time(), Some(at(10, 0)));
        assert_eq!(epic.subtask_ids().collect::<Vec<_>>(), vec![id(2)]);

        let mut task = Item::task(id(5), "Tea", "");
        task.apply_summary(EpicSummary {
            status: Done,
            ..EpicSummary::default()
        });
        assert_eq!(task.status, New);
    }

    #[test]
    fn serializes_kind_and_links() {
        let epic = Item::epic(id(1), "Move", "");
        let subtask = Item::subtask(id(2), &epic, "Pack", "")
            .unwrap()
            .with_window(Some(at(9, 30)), Some(Duration::minutes(60)));

        let json = serde_json::to_value(&subtask).unwrap();
        assert_eq!(json["kind"], "subtask");
        assert_eq!(json["epic"], 1);
        assert_eq!(json["duration_minutes"], 60);
        assert_eq!(json["status"], "new");
    }
}
