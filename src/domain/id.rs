//! Item identifiers
//!
//! Identifiers are positive integers handed out in increasing order by an
//! [`IdGenerator`] owned by the store. They are displayed as plain numbers
//! (`42`) and parsed leniently (`#42` is accepted too).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid item ID: expected a positive integer, got '{0}'")]
    Invalid(String),
}

/// Identifier of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(NonZeroU32);

impl ItemId {
    pub const MIN: ItemId = ItemId(NonZeroU32::MIN);

    /// Creates an ID from a raw value, or None for zero
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Returns the numeric value
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        digits
            .parse::<u32>()
            .ok()
            .and_then(ItemId::new)
            .ok_or_else(|| IdError::Invalid(s.to_string()))
    }
}

/// Monotonic identifier source owned by a store
///
/// Only an explicit [`IdGenerator::reset`] moves the counter backwards.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ID the next admitted item will get, or None once `u32::MAX` is used
    ///
    /// The counter only advances through [`IdGenerator::observe`].
    pub fn peek(&self) -> Option<ItemId> {
        self.last.checked_add(1).and_then(ItemId::new)
    }

    /// Makes sure future IDs are greater than `seen`
    pub fn observe(&mut self, seen: ItemId) {
        self.last = self.last.max(seen.get());
    }

    /// Starts counting from 1 again
    pub fn reset(&mut self) {
        self.last = 0;
    }
}
