//! Snapshot Export Task
//!
//! Runs an export sink off the caller's thread over a snapshot taken at
//! spawn time.

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::facade::Cache;
use crate::persistence::ExportRecord;

/// Snapshots `cache` now and feeds the snapshot to `sink` on the blocking
/// thread pool.
///
/// Entries stored or removed after this call returns are not exported.
pub fn spawn_export_task<F>(cache: &Cache, sink: F) -> JoinHandle<Result<usize>>
where
    F: FnMut(ExportRecord<'_>) -> anyhow::Result<()> + Send + 'static,
{
    let snapshot = cache.snapshot();
    tokio::task::spawn_blocking(move || snapshot.export_to(sink))
}
