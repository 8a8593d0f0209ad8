//! worklog - tasks, epics and subtasks kept in memory
//!
//! The [`engine::ItemStore`] owns every item and maintains two derived
//! indexes: a de-duplicated history of viewed items and a schedule of
//! non-overlapping time windows. Epics derive their status and time window
//! from their subtasks. The `worklog` binary persists the store between runs.

pub mod cli;
pub mod domain;
pub mod engine;
pub mod logging;
pub mod storage;

pub use domain::{Item, ItemId, ItemKind, ItemStatus};
pub use engine::{ItemStore, ItemUpdate, NewItem, SharedStore, StoreError, StoreOptions};
