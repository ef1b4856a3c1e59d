//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::Lifetime;
use crate::disk_unit::{parse_size, DiskUnit};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Ceiling on total serialized bytes
    pub max_bytes: u64,
    /// Lifetime for entries stored without an explicit one
    pub default_lifetime: Lifetime,
    /// Idle window for entries stored without an explicit one
    pub default_idle_ttl: Duration,
    /// Whether newly stored entries are also evicted for inactivity
    pub idle_eviction: bool,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `EASYCACHE_MAX_SIZE` - Size ceiling such as `100mb` (default: 100mb)
    /// - `EASYCACHE_DEFAULT_LIFETIME_MS` - Default lifetime, `-1` for none (default: 1 hour)
    /// - `EASYCACHE_DEFAULT_IDLE_MS` - Default idle window (default: 5 minutes)
    /// - `EASYCACHE_IDLE_EVICTION` - `true`/`false` (default: false)
    /// - `EASYCACHE_SWEEP_INTERVAL_MS` - Sweep frequency (default: 1000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable source, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            max_bytes: lookup("EASYCACHE_MAX_SIZE")
                .and_then(|v| parse_size(&v).ok())
                .unwrap_or(defaults.max_bytes),
            default_lifetime: lookup("EASYCACHE_DEFAULT_LIFETIME_MS")
                .and_then(|v| parse_lifetime(&v))
                .unwrap_or(defaults.default_lifetime),
            default_idle_ttl: lookup("EASYCACHE_DEFAULT_IDLE_MS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_idle_ttl),
            idle_eviction: lookup("EASYCACHE_IDLE_EVICTION")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.idle_eviction),
            sweep_interval: lookup("EASYCACHE_SWEEP_INTERVAL_MS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.sweep_interval),
        }
    }
}

fn parse_lifetime(value: &str) -> Option<Lifetime> {
    let millis: i64 = value.trim().parse().ok()?;
    match millis {
        -1 => Some(Lifetime::Never),
        m if m >= 0 => Some(Lifetime::After(Duration::from_millis(m as u64))),
        _ => None,
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DiskUnit::Megabyte.to_bytes(100),
            default_lifetime: Lifetime::After(Duration::from_secs(60 * 60)),
            default_idle_ttl: Duration::from_secs(5 * 60),
            idle_eviction: false,
            sweep_interval: Duration::from_secs(1),
        }
    }
}
