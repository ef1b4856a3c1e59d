//! Background Tasks Module
//!
//! Tokio tasks that drive the cache from outside the caller's thread.
//!
//! # Tasks
//! - Sweep: evicts expired entries at a fixed interval
//! - Export: hands a cache snapshot to an export sink

mod export;
mod sweep;

pub use export::spawn_export_task;
pub use sweep::spawn_sweep_task;
