//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::config::Config;
use crate::size::HeapSize;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Without this task expired entries stay in the cache, and keep counting
/// toward `size()` and the byte budget, until a lookup or an eviction finds
/// them. The task sleeps for `interval` between sweeps. Each sweep takes the
/// synchronous cache lock, so it runs on the blocking thread pool rather than
/// on a runtime worker.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache: Cache<String, Vec<u8>> = Cache::new(1 << 20, 60_000, -1);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<K, V>(cache: Cache<K, V>, interval: Duration) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: HeapSize + Send + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let sweeper = cache.clone();
            let sweep = tokio::task::spawn_blocking(move || sweeper.cleanup_expired());
            let removed = match sweep.await {
                Ok(removed) => removed,
                Err(err) => {
                    warn!("TTL cleanup sweep failed: {}", err);
                    continue;
                }
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

/// Spawns the cleanup task when `config` enables it.
///
/// Returns `None`, and spawns nothing, when `cleanup_interval_ms` is 0.
pub fn spawn_configured_cleanup<K, V>(
    cache: &Cache<K, V>,
    config: &Config,
) -> Option<JoinHandle<()>>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: HeapSize + Send + 'static,
{
    let interval = config.cleanup_interval()?;
    Some(spawn_cleanup_task(cache.clone(), interval))
}
