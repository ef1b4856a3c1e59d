//! Cache Statistics Module
//!
//! Tracks hits, misses, sweep evictions and size usage.

use serde::Serialize;

// == Cache Stats ==
/// Cache counters and gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Fetches that found their key
    pub hits: u64,
    /// Fetches for keys that are not present
    pub misses: u64,
    /// Entries removed by the sweep
    pub evictions: u64,
    /// Stores refused by the size budget
    pub rejected_stores: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Serialized bytes held
    pub used_bytes: u64,
    /// Configured size ceiling
    pub max_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was fetched.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_rejected_store(&mut self) {
        self.rejected_stores += 1;
    }

    // == Gauges ==
    /// Updates the entry and byte gauges.
    pub fn set_usage(&mut self, total_entries: usize, used_bytes: u64, max_bytes: u64) {
        self.total_entries = total_entries;
        self.used_bytes = used_bytes;
        self.max_bytes = max_bytes;
    }
}
