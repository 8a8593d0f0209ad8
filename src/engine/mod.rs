//! The item store and its indexes
//!
//! [`ItemStore`] is single-threaded; wrap it in a [`SharedStore`] to use it
//! from several threads.

mod record;
mod shared;
mod store;

pub use record::ItemRecord;
pub use shared::SharedStore;
pub use store::{ItemStore, ItemUpdate, NewItem, StoreError, StoreOptions};
