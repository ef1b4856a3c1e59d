//! Eviction Index Module
//!
//! Keeps keys ordered by effective deadline so that expired keys always form
//! a prefix of the order.

use std::collections::BTreeMap;

use crate::cache::entry::Deadline;

// == Order Key ==
/// Position of a key in the eviction order.
///
/// Sorts by deadline, then by insertion sequence so equal deadlines keep
/// the order they were inserted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub deadline: Deadline,
    pub seq: u64,
}

// == Eviction Index ==
/// Deadline-ordered key index.
///
/// - Front = soonest deadline
/// - Back = latest deadline, `Deadline::Never` entries last
#[derive(Debug, Default)]
pub struct EvictionIndex {
    order: BTreeMap<OrderKey, String>,
    next_seq: u64,
}

impl EvictionIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Inserts `key` after every entry with a deadline `<= deadline`.
    pub fn insert(&mut self, key: &str, deadline: Deadline) -> OrderKey {
        let slot = OrderKey {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.order.insert(slot, key.to_string());
        slot
    }

    // == Remove ==
    /// Removes the key stored at `slot`.
    pub fn remove(&mut self, slot: &OrderKey) -> Option<String> {
        self.order.remove(slot)
    }

    // == Reposition ==
    /// Moves the key at `slot` to `deadline`. A key whose deadline is
    /// unchanged keeps its place.
    pub fn reposition(&mut self, slot: OrderKey, deadline: Deadline) -> OrderKey {
        if slot.deadline == deadline {
            return slot;
        }
        match self.order.remove(&slot) {
            Some(key) => self.insert(&key, deadline),
            None => slot,
        }
    }

    // == Expired Prefix ==
    /// Keys whose deadline has passed at `now`, front to back.
    ///
    /// Stops at the first live key; everything behind it is live too.
    pub fn expired_prefix(&self, now: i64) -> Vec<String> {
        self.order
            .iter()
            .take_while(|(slot, _)| slot.deadline.has_passed(now))
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Keys in eviction order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }

    /// Slots and keys in eviction order.
    pub fn iter(&self) -> impl Iterator<Item = (&OrderKey, &str)> {
        self.order.iter().map(|(slot, key)| (slot, key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
