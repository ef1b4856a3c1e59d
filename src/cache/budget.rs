//! Size Budget Module
//!
//! Tracks serialized bytes held by the cache against a ceiling.
//!
//! Only encoded value bytes are counted, so real memory use is higher than
//! `used()` reports.

use crate::error::{CacheError, Result};

// == Size Budget ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBudget {
    used: u64,
    max: u64,
}

impl SizeBudget {
    pub fn new(max: u64) -> Self {
        Self { used: 0, max }
    }

    // == Check ==
    /// Verifies that adding `bytes` after releasing `credit` stays within
    /// the ceiling. Nothing is changed.
    pub fn check(&self, bytes: u64, credit: u64) -> Result<()> {
        let after = self.used.saturating_sub(credit).saturating_add(bytes);
        if after > self.max {
            return Err(CacheError::CapacityExceeded {
                requested: bytes,
                used: self.used,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Adds `bytes` to the running total.
    pub fn charge(&mut self, bytes: u64) {
        self.used = self.used.saturating_add(bytes);
    }

    /// Subtracts `bytes` from the running total.
    pub fn release(&mut self, bytes: u64) {
        self.used = self.used.saturating_sub(bytes);
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    // == Set Max ==
    /// Replaces the ceiling. Existing usage above the new ceiling is kept;
    /// only later stores are refused.
    pub fn set_max(&mut self, max: u64) {
        self.max = max;
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn remaining(&self) -> u64 {
        self.max.saturating_sub(self.used)
    }
}
