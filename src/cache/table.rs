//! Cache Table Module
//!
//! Main cache engine combining HashMap storage with the deadline-ordered
//! eviction index and the size budget. All operations take `now` explicitly.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::entry::{CacheEntry, Lifetime};
use crate::cache::index::{EvictionIndex, OrderKey};
use crate::cache::{CacheStats, SizeBudget, MAX_KEY_LENGTH};
use crate::codec::Encoded;
use crate::error::{CacheError, Result};

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    order: OrderKey,
}

// == Cache Table ==
/// Key table, eviction index and size budget kept in step.
///
/// The index and the map always hold the same key set, and `used_bytes`
/// always equals the sum of the entries' serialized sizes.
#[derive(Debug)]
pub struct CacheTable {
    /// Key-value storage
    entries: HashMap<String, Slot>,
    /// Keys ordered by effective deadline
    index: EvictionIndex,
    /// Serialized byte accounting
    budget: SizeBudget,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheTable {
    // == Constructor ==
    /// Creates an empty table holding at most `max_bytes` serialized bytes.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            entries: HashMap::new(),
            index: EvictionIndex::new(),
            budget: SizeBudget::new(max_bytes),
            stats: CacheStats::new(),
        }
    }

    // == Store ==
    /// Stores an encoded value under `key`.
    ///
    /// An existing entry for `key` is replaced and its bytes credited before
    /// the budget check. On error nothing changes.
    pub fn store(
        &mut self,
        key: &str,
        encoded: Encoded,
        lifetime: Lifetime,
        idle_ttl: Duration,
        idle_eviction: bool,
        now: i64,
    ) -> Result<()> {
        validate_key(key)?;

        let size = encoded.size();
        let credit = self
            .entries
            .get(key)
            .map_or(0, |slot| slot.entry.serialized_size);

        if let Err(err) = self.budget.check(size, credit) {
            self.stats.record_rejected_store();
            warn!(
                key,
                size,
                used = self.budget.used(),
                max = self.budget.max(),
                "Rejected store: size budget exceeded"
            );
            return Err(err);
        }

        let replaced = self.delete(key);

        let entry = CacheEntry::new(encoded, lifetime, idle_ttl, idle_eviction, now);
        let order = self.index.insert(key, entry.effective_deadline());
        self.budget.charge(size);
        self.entries.insert(key.to_string(), Slot { entry, order });

        debug!(key, size, replaced, "Stored cache entry");
        Ok(())
    }

    // == Fetch ==
    /// Looks up `key`, refreshing its idle deadline on a hit.
    ///
    /// Expiry is not checked here; expired entries stay readable until the
    /// next sweep.
    pub fn fetch(&mut self, key: &str, now: i64) -> Option<&CacheEntry> {
        let Some(slot) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return None;
        };

        slot.entry.refresh_idle(now);
        slot.order = self
            .index
            .reposition(slot.order, slot.entry.effective_deadline());
        self.stats.record_hit();

        Some(&slot.entry)
    }

    // == Peek ==
    /// Looks up `key` without touching deadlines or statistics.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).map(|slot| &slot.entry)
    }

    // == Delete ==
    /// Removes `key`. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(slot) => {
                self.index.remove(&slot.order);
                self.budget.release(slot.entry.serialized_size);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry and resets the byte count.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.budget.reset();
    }

    // == Sweep ==
    /// Evicts every entry whose effective deadline is at or before `now`.
    ///
    /// Expired keys are collected from the front of the index first, then
    /// deleted. Returns the evicted keys in eviction order.
    pub fn sweep(&mut self, now: i64) -> Vec<String> {
        let expired = self.index.expired_prefix(now);

        for key in &expired {
            self.delete(key);
        }

        self.stats.record_evictions(expired.len());
        expired
    }

    // == Budget ==
    /// Replaces the byte ceiling without evicting anything.
    pub fn set_max_bytes(&mut self, max_bytes: u64) {
        self.budget.set_max(max_bytes);
    }

    pub fn used_bytes(&self) -> u64 {
        self.budget.used()
    }

    pub fn max_bytes(&self) -> u64 {
        self.budget.max()
    }

    /// Bytes still available under the ceiling.
    pub fn remaining_bytes(&self) -> u64 {
        self.budget.remaining()
    }

    // == Inspection ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys front to back: soonest deadline first.
    pub fn keys_in_eviction_order(&self) -> Vec<String> {
        self.index.keys().map(str::to_string).collect()
    }

    /// Copies of all entries in eviction order.
    pub fn snapshot(&self) -> Vec<(String, CacheEntry)> {
        self.index
            .keys()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|slot| (key.to_string(), slot.entry.clone()))
            })
            .collect()
    }

    /// Returns current statistics with up-to-date gauges.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.entries.len(), self.budget.used(), self.budget.max());
        stats
    }

    // == Invariants ==
    /// Verifies that map, index and budget agree.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.index.len() != self.entries.len() {
            return Err(format!(
                "index holds {} keys but table holds {}",
                self.index.len(),
                self.entries.len()
            ));
        }

        let mut previous = None;
        for (order, key) in self.index.iter() {
            let slot = self
                .entries
                .get(key)
                .ok_or_else(|| format!("indexed key '{}' missing from table", key))?;
            if slot.order != *order {
                return Err(format!("key '{}' has a stale index slot", key));
            }
            if order.deadline != slot.entry.effective_deadline() {
                return Err(format!("key '{}' is indexed under an old deadline", key));
            }
            if previous.is_some_and(|prev| prev > order.deadline) {
                return Err(format!("index out of order at key '{}'", key));
            }
            previous = Some(order.deadline);
        }

        let total: u64 = self
            .entries
            .values()
            .map(|slot| slot.entry.serialized_size)
            .sum();
        if total != self.budget.used() {
            return Err(format!(
                "used bytes {} differ from entry total {}",
                self.budget.used(),
                total
            ));
        }

        Ok(())
    }
}

// == Key Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
