//! Domain models for worklog
//!
//! Contains the item model and the two derived indexes, without any I/O
//! concerns.

mod id;
mod item;
mod history;
mod schedule;

pub use id::{IdError, IdGenerator, ItemId};
pub use item::{EpicSummary, Hierarchy, Item, ItemError, ItemKind, ItemStatus};
pub use history::History;
pub use schedule::{Schedule, ScheduleError, TimeSlot};
