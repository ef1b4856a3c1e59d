//! Cache Entry Module
//!
//! Defines individual cache entries with lifetime and idle deadlines.

use std::time::Duration;

use serde_json::Value;

use crate::clock::duration_ms;
use crate::codec::Encoded;

// == Deadline ==
/// An absolute eviction deadline in Unix milliseconds.
///
/// `Never` orders after every finite deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Deadline {
    At(i64),
    Never,
}

impl Deadline {
    /// Whether the deadline has been reached at `now`.
    pub fn has_passed(self, now: i64) -> bool {
        match self {
            Deadline::At(at) => at <= now,
            Deadline::Never => false,
        }
    }
}

// == Lifetime ==
/// Fixed time-to-live measured from creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// The entry is never evicted by the sweep
    Never,
    After(Duration),
}

impl Lifetime {
    /// Absolute deadline for an entry created at `now`.
    pub fn deadline_from(self, now: i64) -> Deadline {
        match self {
            Lifetime::Never => Deadline::Never,
            Lifetime::After(ttl) => Deadline::At(now.saturating_add(duration_ms(ttl))),
        }
    }
}

impl From<Duration> for Lifetime {
    fn from(ttl: Duration) -> Self {
        Lifetime::After(ttl)
    }
}

// == Cache Entry ==
/// A single cached value and its eviction metadata.
///
/// Equality compares stored values only, so two entries under different
/// keys holding the same value are equal.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Length of the value's encoded token
    pub serialized_size: u64,
    /// Lifetime deadline
    pub expires_at: Deadline,
    /// Rolling inactivity window
    pub idle_ttl: Duration,
    /// Inactivity deadline (Unix milliseconds)
    pub idle_deadline: i64,
    /// Whether the idle deadline takes part in eviction
    pub idle_eviction: bool,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry at `now`. The idle deadline starts refreshed.
    pub fn new(
        encoded: Encoded,
        lifetime: Lifetime,
        idle_ttl: Duration,
        idle_eviction: bool,
        now: i64,
    ) -> Self {
        let serialized_size = encoded.size();
        let mut entry = Self {
            value: encoded.value,
            serialized_size,
            expires_at: lifetime.deadline_from(now),
            idle_ttl,
            idle_deadline: now,
            idle_eviction,
        };
        entry.refresh_idle(now);
        entry
    }

    // == Refresh Idle ==
    /// Pushes the idle deadline to `now + idle_ttl`.
    pub fn refresh_idle(&mut self, now: i64) {
        self.idle_deadline = now.saturating_add(duration_ms(self.idle_ttl));
    }

    // == Effective Deadline ==
    /// The deadline the entry is ordered and swept by.
    ///
    /// With idle eviction enabled this is the sooner of the lifetime and
    /// idle deadlines. Entries without a lifetime deadline are never swept,
    /// whatever their idle state.
    pub fn effective_deadline(&self) -> Deadline {
        match self.expires_at {
            Deadline::Never => Deadline::Never,
            Deadline::At(at) if self.idle_eviction => Deadline::At(at.min(self.idle_deadline)),
            at => at,
        }
    }

    // == Is Expired ==
    /// Returns `true` once `now` reaches the effective deadline.
    pub fn is_expired(&self, now: i64) -> bool {
        self.effective_deadline().has_passed(now)
    }

    // == Remaining ==
    /// Milliseconds until the effective deadline, `Some(0)` once passed,
    /// `None` for entries that never expire.
    pub fn remaining_ms(&self, now: i64) -> Option<u64> {
        match self.effective_deadline() {
            Deadline::At(at) => Some(u64::try_from(at.saturating_sub(now)).unwrap_or(0)),
            Deadline::Never => None,
        }
    }
}

impl PartialEq for CacheEntry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
