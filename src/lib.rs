//! Easy Cache - An in-process object cache
//!
//! Stores serializable values under string keys with lifetime and idle
//! expiry, evicts them with a deadline-ordered sweep and enforces a total
//! serialized-size budget.

pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod disk_unit;
pub mod error;
pub mod facade;
pub mod persistence;
pub mod tasks;

pub use cache::{CacheStats, Lifetime};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use disk_unit::DiskUnit;
pub use error::{CacheError, Result};
pub use facade::Cache;
pub use persistence::{CacheSnapshot, ExportRecord, LoadResult};
pub use tasks::{spawn_export_task, spawn_sweep_task};
