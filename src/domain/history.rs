//! View history
//!
//! A de-duplicating, most-recent-last list of item snapshots. Nodes live in
//! a slab (`Vec<Option<Node>>`) and are chained by index, so touching or
//! removing an ID is O(1) through the ID → slot map.
//!
//! Entries are snapshots: the item is cloned when it is recorded, and later
//! edits to the live item do not change what the history shows.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use super::id::ItemId;
use super::item::Item;

#[derive(Debug, Clone)]
struct Node {
    entry: Item,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Recently viewed items, oldest first
#[derive(Debug, Clone, Default)]
pub struct History {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<ItemId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    limit: Option<NonZeroUsize>,
}

impl History {
    /// Creates an unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history that evicts its oldest entry past `capacity`
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self {
            limit: Some(capacity),
            ..Self::default()
        }
    }

    /// Creates a history with an optional bound
    pub fn with_limit(limit: Option<NonZeroUsize>) -> Self {
        match limit {
            Some(capacity) => Self::bounded(capacity),
            None => Self::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    /// Records a snapshot of `item` as the most recent entry
    ///
    /// An earlier entry for the same ID is dropped.
    pub fn touch(&mut self, item: &Item) {
        let slot = match self.index.get(&item.id).copied() {
            Some(slot) => {
                self.unlink(slot);
                if let Some(node) = self.nodes[slot].as_mut() {
                    node.entry = item.clone();
                }
                slot
            }
            None => {
                let slot = self.allocate(item.clone());
                self.index.insert(item.id, slot);
                slot
            }
        };
        self.link_last(slot);

        if let Some(limit) = self.limit {
            while self.index.len() > limit.get() {
                match self.head.and_then(|head| self.entry_id(head)) {
                    Some(oldest) => {
                        self.remove(oldest);
                    }
                    None => break,
                }
            }
        }
    }

    /// Drops the entry for `id`; returns false if there was none
    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        self.unlink(slot);
        self.nodes[slot] = None;
        self.free.push(slot);
        true
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Entries from oldest to most recent
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            history: self,
            cursor: self.head,
        }
    }

    /// Independent copies of all entries, oldest first
    pub fn list(&self) -> Vec<Item> {
        self.iter().cloned().collect()
    }

    /// Recorded IDs, oldest first
    pub fn ids(&self) -> Vec<ItemId> {
        self.iter().map(|item| item.id).collect()
    }

    fn entry_id(&self, slot: usize) -> Option<ItemId> {
        self.nodes[slot].as_ref().map(|node| node.entry.id)
    }

    fn allocate(&mut self, entry: Item) -> usize {
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.nodes[slot].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.nodes[prev].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(node) = self.nodes[next].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn link_last(&mut self, slot: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.nodes[slot].as_mut() {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => {
                if let Some(node) = self.nodes[tail].as_mut() {
                    node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }
}

/// Iterator over history entries, oldest first
pub struct Iter<'a> {
    history: &'a History,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<Self::Item> {
        let history: &'a History = self.history;
        let node = history.nodes[self.cursor?].as_ref()?;
        self.cursor = node.next;
        Some(&node.entry)
    }
}
