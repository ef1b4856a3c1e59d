//! Expiry Sweep Task
//!
//! Background task that periodically evicts expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::facade::Cache;

/// Spawns a background task that sweeps `cache` every `interval`.
///
/// The task runs until aborted through the returned handle.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::new(CacheConfig::from_env()));
/// let sweep_handle = spawn_sweep_task(cache.clone(), cache.sweep_interval());
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<Cache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep();

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}
