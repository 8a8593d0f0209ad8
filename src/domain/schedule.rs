//! Time-ordered schedule of non-overlapping items
//!
//! Every member occupies a half-open slot `[start, end)`. Two slots that only
//! touch at an endpoint do not overlap.
//!
//! Members are keyed by `(start, id)` so iteration is ascending by start with
//! ties broken by ID. Because members never overlap, ordering by start also
//! orders them by end, so an overlap check only has to look at the member
//! with the latest start before the candidate's end: insert, remove and the
//! overlap check are all O(log n).

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use super::id::ItemId;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("Item {id} overlaps scheduled item {conflicting}")]
    Overlap { id: ItemId, conflicting: ItemId },
}

/// Half-open time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeSlot {
    /// Returns None for non-positive durations or an end past the calendar
    pub fn new(start: NaiveDateTime, duration: Duration) -> Option<Self> {
        if duration <= Duration::zero() {
            return None;
        }
        let end = start.checked_add_signed(duration)?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Strict overlap: `a.start < b.end && b.start < a.end`
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The set of scheduled items
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    by_time: BTreeMap<(NaiveDateTime, ItemId), NaiveDateTime>,
    slots: HashMap<ItemId, TimeSlot>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn slot(&self, id: ItemId) -> Option<TimeSlot> {
        self.slots.get(&id).copied()
    }

    /// Finds a member overlapping `slot`, other than `id` itself
    pub fn check(&self, id: ItemId, slot: TimeSlot) -> Result<(), ScheduleError> {
        let candidate = self
            .by_time
            .range(..(slot.end, ItemId::MIN))
            .rev()
            .find(|((_, member), _)| *member != id);

        match candidate {
            Some(((start, member), end)) if slot.overlaps(&TimeSlot { start: *start, end: *end }) => {
                Err(ScheduleError::Overlap {
                    id,
                    conflicting: *member,
                })
            }
            _ => Ok(()),
        }
    }

    /// Adds an item, rejecting it if it overlaps any member
    ///
    /// An existing entry for the same ID is replaced.
    pub fn insert(&mut self, id: ItemId, slot: TimeSlot) -> Result<(), ScheduleError> {
        self.replace(id, Some(slot))
    }

    /// Removes an item; returns false if it was not scheduled
    pub fn remove(&mut self, id: ItemId) -> bool {
        match self.slots.remove(&id) {
            Some(slot) => {
                self.by_time.remove(&(slot.start, id));
                true
            }
            None => false,
        }
    }

    /// Swaps the slot of `id` for `slot` (or unschedules it for None)
    ///
    /// The old slot is removed before `slot` is validated, so an item never
    /// conflicts with its own previous window. On conflict the old slot is
    /// restored and the schedule is left unchanged.
    pub fn replace(&mut self, id: ItemId, slot: Option<TimeSlot>) -> Result<(), ScheduleError> {
        let previous = self.slots.get(&id).copied();
        self.remove(id);

        let Some(slot) = slot else {
            return Ok(());
        };

        if let Err(err) = self.check(id, slot) {
            if let Some(previous) = previous {
                self.link(id, previous);
            }
            return Err(err);
        }

        self.link(id, slot);
        Ok(())
    }

    fn link(&mut self, id: ItemId, slot: TimeSlot) {
        self.by_time.insert((slot.start, id), slot.end);
        self.slots.insert(id, slot);
    }

    /// Member IDs ascending by start, ties by ID
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.by_time.keys().map(|(_, id)| *id)
    }

    /// Members with their slots, in schedule order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, TimeSlot)> + '_ {
        self.by_time
            .iter()
            .map(|((start, id), end)| (*id, TimeSlot { start: *start, end: *end }))
    }

    pub fn clear(&mut self) {
        self.by_time.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn id(value: u32) -> ItemId {
        ItemId::new(value).unwrap()
    }

    fn slot(hour: u32, minute: u32, minutes: i64) -> TimeSlot {
        let start = NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        TimeSlot::new(start, Duration::minutes(minutes)).unwrap()
    }

    #[test]
    fn slot_requires_positive_duration() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(TimeSlot::new(start, Duration::zero()).is_none());
        assert!(TimeSlot::new(start, Duration::minutes(-5)).is_none());
    }

    #[test]
    fn touching_slots_do_not_overlap() {
        assert!(!slot(11, 0, 10).overlaps(&slot(11, 10, 5)));
        assert!(slot(11, 0, 10).overlaps(&slot(11, 5, 10)));
        assert!(slot(11, 0, 60).overlaps(&slot(11, 15, 5)));
    }

    #[test]
    fn insert_rejects_overlap() {
        let mut schedule = Schedule::new();
        schedule.insert(id(1), slot(11, 0, 10)).unwrap();
        schedule.insert(id(2), slot(11, 10, 5)).unwrap();

        let err = schedule.insert(id(3), slot(11, 5, 10)).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Overlap {
                id: id(3),
                conflicting: id(1)
            }
        );
        assert_eq!(schedule.ids().collect::<Vec<_>>(), vec![id(1), id(2)]);
    }

    #[test]
    fn detects_overlap_with_long_earlier_member() {
        let mut schedule = Schedule::new();
        schedule.insert(id(1), slot(9, 0, 180)).unwrap();

        assert!(schedule.check(id(2), slot(10, 0, 5)).is_err());
        assert!(schedule.check(id(2), slot(8, 0, 61)).is_err());
        assert!(schedule.check(id(2), slot(8, 0, 60)).is_ok());
        assert!(schedule.check(id(2), slot(12, 0, 60)).is_ok());
    }

    #[test]
    fn orders_by_start_then_id() {
        let mut schedule = Schedule::new();
        schedule.insert(id(5), slot(12, 0, 30)).unwrap();
        schedule.insert(id(3), slot(9, 0, 30)).unwrap();
        schedule.insert(id(4), slot(10, 0, 30)).unwrap();

        assert_eq!(
            schedule.ids().collect::<Vec<_>>(),
            vec![id(3), id(4), id(5)]
        );
    }

    #[test]
    fn replace_does_not_conflict_with_itself() {
        let mut schedule = Schedule::new();
        schedule.insert(id(1), slot(9, 0, 60)).unwrap();

        schedule.replace(id(1), Some(slot(9, 0, 60))).unwrap();
        schedule.replace(id(1), Some(slot(9, 30, 60))).unwrap();
        assert_eq!(schedule.slot(id(1)), Some(slot(9, 30, 60)));
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn failed_replace_keeps_old_slot() {
        let mut schedule = Schedule::new();
        schedule.insert(id(1), slot(9, 0, 60)).unwrap();
        schedule.insert(id(2), slot(11, 0, 60)).unwrap();

        assert!(schedule.replace(id(2), Some(slot(9, 30, 30))).is_err());
        assert_eq!(schedule.slot(id(2)), Some(slot(11, 0, 60)));
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn replace_with_none_unschedules() {
        let mut schedule = Schedule::new();
        schedule.insert(id(1), slot(9, 0, 60)).unwrap();
        schedule.replace(id(1), None).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut schedule = Schedule::new();
        assert!(!schedule.remove(id(1)));

        schedule.insert(id(1), slot(9, 0, 60)).unwrap();
        assert!(schedule.remove(id(1)));
        assert!(!schedule.contains(id(1)));
        assert_eq!(schedule.iter().count(), 0);
    }
}
