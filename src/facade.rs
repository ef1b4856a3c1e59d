//! Cache Facade
//!
//! The public, thread-safe cache handle. Every operation runs under one
//! lock so size and ordering invariants hold across each call.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheTable, Lifetime};
use crate::clock::{Clock, SystemClock};
use crate::codec::{Encoded, JsonCodec};
use crate::config::CacheConfig;
use crate::disk_unit::DiskUnit;
use crate::error::Result;

#[derive(Debug)]
struct CacheState {
    table: CacheTable,
    default_lifetime: Lifetime,
    default_idle_ttl: Duration,
    idle_eviction: bool,
}

// == Cache ==
/// An in-process object cache.
///
/// Values are stored in encoded form and decoded into the type requested
/// by `fetch`. Share it between threads as `Arc<Cache>`.
#[derive(Debug)]
pub struct Cache {
    state: Mutex<CacheState>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache reading wall-clock time.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                table: CacheTable::new(config.max_bytes),
                default_lifetime: config.default_lifetime,
                default_idle_ttl: config.default_idle_ttl,
                idle_eviction: config.idle_eviction,
            }),
            clock,
            sweep_interval: config.sweep_interval,
        }
    }

    // == Store ==
    /// Stores `value` with the default lifetime and idle window.
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.store_encoded(key, JsonCodec::encode(value)?, None, None)
    }

    /// Stores `value` with an explicit lifetime and the default idle window.
    pub fn store_with_lifetime<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        lifetime: impl Into<Lifetime>,
    ) -> Result<()> {
        self.store_encoded(key, JsonCodec::encode(value)?, Some(lifetime.into()), None)
    }

    /// Stores `value` with an explicit lifetime and idle window.
    pub fn store_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        lifetime: impl Into<Lifetime>,
        idle_ttl: Duration,
    ) -> Result<()> {
        self.store_encoded(
            key,
            JsonCodec::encode(value)?,
            Some(lifetime.into()),
            Some(idle_ttl),
        )
    }

    pub(crate) fn store_encoded(
        &self,
        key: &str,
        encoded: Encoded,
        lifetime: Option<Lifetime>,
        idle_ttl: Option<Duration>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let lifetime = lifetime.unwrap_or(state.default_lifetime);
        let idle_ttl = idle_ttl.unwrap_or(state.default_idle_ttl);
        let idle_eviction = state.idle_eviction;
        let now = self.clock.now_ms();

        state
            .table
            .store(key, encoded, lifetime, idle_ttl, idle_eviction, now)
    }

    // == Fetch ==
    /// Retrieves the value under `key` as `T`.
    ///
    /// Returns `Ok(None)` when the key is absent. A hit always refreshes the
    /// idle deadline, even when decoding into `T` then fails with
    /// `TypeMismatch`.
    pub fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();

        match state.table.fetch(key, now) {
            Some(entry) => JsonCodec::decode(key, &entry.value).map(Some),
            None => Ok(None),
        }
    }

    // == Delete ==
    /// Removes `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.state.lock().table.delete(key);
        debug!(key, removed, "Deleted cache entry");
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&self) {
        self.state.lock().table.clear();
        debug!("Cleared cache");
    }

    // == Sweep ==
    /// Evicts every entry whose effective deadline has passed.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();
        let evicted = state.table.sweep(now);
        if !evicted.is_empty() {
            debug!(keys = ?evicted, "Swept expired entries");
        }
        evicted.len()
    }

    // == Configuration ==
    /// Replaces the size ceiling. Entries already stored are kept even when
    /// they exceed it.
    pub fn set_max_size(&self, unit: DiskUnit, amount: u64) {
        let max_bytes = unit.to_bytes(amount);
        self.state.lock().table.set_max_bytes(max_bytes);
        info!(max_bytes, "Cache size limit changed");
    }

    pub fn max_size(&self) -> u64 {
        self.state.lock().table.max_bytes()
    }

    /// Sets the lifetime used by `store`.
    pub fn set_default_lifetime(&self, lifetime: impl Into<Lifetime>) {
        let lifetime = lifetime.into();
        self.state.lock().default_lifetime = lifetime;
        info!(?lifetime, "Default lifetime changed");
    }

    pub fn default_lifetime(&self) -> Lifetime {
        self.state.lock().default_lifetime
    }

    /// Sets the idle window used by `store` and `store_with_lifetime`.
    pub fn set_default_idle_ttl(&self, idle_ttl: Duration) {
        self.state.lock().default_idle_ttl = idle_ttl;
        info!(?idle_ttl, "Default idle window changed");
    }

    pub fn default_idle_ttl(&self) -> Duration {
        self.state.lock().default_idle_ttl
    }

    /// Enables or disables idle eviction for entries stored from now on.
    pub fn set_idle_eviction(&self, enabled: bool) {
        self.state.lock().idle_eviction = enabled;
        info!(enabled, "Idle eviction toggled");
    }

    pub fn idle_eviction(&self) -> bool {
        self.state.lock().idle_eviction
    }

    /// Interval the background sweep task should use.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// The settings currently in force, including changes made through the
    /// setters since construction.
    pub fn config(&self) -> CacheConfig {
        let state = self.state.lock();
        CacheConfig {
            max_bytes: state.table.max_bytes(),
            default_lifetime: state.default_lifetime,
            default_idle_ttl: state.default_idle_ttl,
            idle_eviction: state.idle_eviction,
            sweep_interval: self.sweep_interval,
        }
    }

    // == Inspection ==
    pub fn used_bytes(&self) -> u64 {
        self.state.lock().table.used_bytes()
    }

    /// Bytes that can still be stored before hitting the size ceiling.
    pub fn remaining_bytes(&self) -> u64 {
        self.state.lock().table.remaining_bytes()
    }

    /// Time left before `key` is due for eviction, without counting as an
    /// access. `None` when absent, `Lifetime::Never` when the sweep never
    /// removes it.
    pub fn time_to_live(&self, key: &str) -> Option<Lifetime> {
        let state = self.state.lock();
        let now = self.clock.now_ms();

        state
            .table
            .peek(key)
            .map(|entry| match entry.remaining_ms(now) {
                Some(ms) => Lifetime::After(Duration::from_millis(ms)),
                None => Lifetime::Never,
            })
    }

    pub fn len(&self) -> usize {
        self.state.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().table.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().table.contains_key(key)
    }

    /// Keys ordered soonest deadline first.
    pub fn keys_in_eviction_order(&self) -> Vec<String> {
        self.state.lock().table.keys_in_eviction_order()
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().table.stats()
    }

    /// Verifies that the key table, eviction order and byte count agree.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.state.lock().table.check_invariants()
    }

    pub(crate) fn snapshot_entries(&self) -> Vec<(String, crate::cache::CacheEntry)> {
        self.state.lock().table.snapshot()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CacheError;

    fn cache_at(start: i64) -> (Cache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let cache = Cache::with_clock(CacheConfig::default(), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_store_and_fetch_typed() {
        let (cache, _) = cache_at(0);

        cache.store("numbers", &vec![1, 2, 3]).unwrap();
        let numbers: Option<Vec<u32>> = cache.fetch("numbers").unwrap();

        assert_eq!(numbers, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_fetch_missing_is_none() {
        let (cache, _) = cache_at(0);
        assert_eq!(cache.fetch::<String>("missing").unwrap(), None);
    }

    #[test]
    fn test_fetch_wrong_type() {
        let (cache, _) = cache_at(0);

        cache.store("Key", &1000).unwrap();
        let result = cache.fetch::<Vec<i64>>("Key");
        assert!(matches!(result, Err(CacheError::TypeMismatch { .. })));
        assert_eq!(cache.fetch::<i32>("Key").unwrap(), Some(1000));
    }

    #[test]
    fn test_type_mismatch_still_refreshes_idle() {
        let (cache, clock) = cache_at(0);
        cache.set_idle_eviction(true);
        cache
            .store_with("Key", &1, Duration::from_secs(60), Duration::from_millis(100))
            .unwrap();

        clock.advance(Duration::from_millis(90));
        assert!(cache.fetch::<String>("Key").is_err());

        clock.advance(Duration::from_millis(90));
        assert_eq!(cache.sweep(), 0);
        assert!(cache.contains_key("Key"));
    }

    #[test]
    fn test_default_lifetime_applies() {
        let (cache, clock) = cache_at(0);
        cache.set_default_lifetime(Duration::from_millis(10));

        cache.store("short", "v").unwrap();
        cache
            .store_with_lifetime("forever", "v", Lifetime::Never)
            .unwrap();

        clock.advance(Duration::from_millis(10));
        assert_eq!(cache.sweep(), 1);
        assert!(cache.contains_key("forever"));
    }

    #[test]
    fn test_idle_eviction_only_affects_later_entries() {
        let (cache, clock) = cache_at(0);
        cache.set_default_idle_ttl(Duration::from_millis(5));

        cache.store("before", "v").unwrap();
        cache.set_idle_eviction(true);
        cache.store("after", "v").unwrap();

        clock.advance(Duration::from_millis(5));
        assert_eq!(cache.sweep(), 1);
        assert!(cache.contains_key("before"));
        assert!(!cache.contains_key("after"));
    }

    #[test]
    fn test_set_max_size() {
        let (cache, _) = cache_at(0);

        cache.set_max_size(DiskUnit::Byte, 1);
        assert_eq!(cache.max_size(), 1);
        assert!(matches!(
            cache.store("k", &100000),
            Err(CacheError::CapacityExceeded { .. })
        ));

        cache.set_max_size(DiskUnit::Megabyte, 100);
        cache.store("k", &100000).unwrap();
        assert_eq!(cache.used_bytes(), 6);
    }

    #[test]
    fn test_config_reflects_setters() {
        let (cache, _) = cache_at(0);
        assert_eq!(cache.config(), CacheConfig::default());

        cache.set_max_size(DiskUnit::Kilobyte, 2);
        cache.set_default_lifetime(Lifetime::Never);
        cache.set_default_idle_ttl(Duration::from_millis(250));
        cache.set_idle_eviction(true);

        let config = cache.config();
        assert_eq!(config.max_bytes, 2_000);
        assert_eq!(config.default_lifetime, Lifetime::Never);
        assert_eq!(config.default_idle_ttl, Duration::from_millis(250));
        assert!(config.idle_eviction);
        assert_eq!(config.sweep_interval, CacheConfig::default().sweep_interval);
    }

    #[test]
    fn test_time_to_live_and_remaining_bytes() {
        let (cache, clock) = cache_at(0);
        cache.set_max_size(DiskUnit::Byte, 20);

        cache
            .store_with_lifetime("short", "v", Duration::from_millis(100))
            .unwrap();
        cache
            .store_with_lifetime("pinned", "v", Lifetime::Never)
            .unwrap();
        assert_eq!(cache.remaining_bytes(), 14);

        clock.advance(Duration::from_millis(40));
        assert_eq!(
            cache.time_to_live("short"),
            Some(Lifetime::After(Duration::from_millis(60)))
        );
        assert_eq!(cache.time_to_live("pinned"), Some(Lifetime::Never));
        assert_eq!(cache.time_to_live("missing"), None);

        clock.advance(Duration::from_millis(100));
        assert_eq!(
            cache.time_to_live("short"),
            Some(Lifetime::After(Duration::ZERO))
        );
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_delete_and_clear() {
        let (cache, _) = cache_at(0);

        cache.store("a", "1").unwrap();
        cache.store("b", "2").unwrap();

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_stats_reflect_operations() {
        let (cache, _) = cache_at(0);

        cache.store("a", "1").unwrap();
        let _ = cache.fetch::<String>("a");
        let _ = cache.fetch::<String>("b");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.used_bytes, 3);
    }

    #[test]
    fn test_cache_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Cache>();
    }

    #[test]
    fn test_concurrent_stores_keep_invariants() {
        let cache = Arc::new(Cache::default());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("k{}", i % 25);
                        cache.store(&key, &(t * 1000 + i)).unwrap();
                        if i % 7 == 0 {
                            cache.delete(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        cache.check_invariants().unwrap();
        assert!(cache.len() <= 25);
    }
}
