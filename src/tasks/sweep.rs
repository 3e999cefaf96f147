//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache items, so that
//! items nobody retrieves anymore still get disposed promptly.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::BackingStore;
use crate::shared::SharedCache;

/// Spawns a background task that periodically evicts expired cache items.
///
/// The task runs in an infinite loop, sleeping for the given interval
/// between sweeps. Each sweep takes the cache lock once; disposal hooks of
/// swept items run outside it.
///
/// # Arguments
/// * `cache` - Shared cache handle to sweep
/// * `interval` - Delay between sweep runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be aborted during
/// shutdown.
///
/// # Example
/// ```ignore
/// let cache: SharedCache<String, String> = SharedCache::new(CacheConfig::new())?;
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V, S>(cache: SharedCache<K, V, S>, interval: Duration) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
    S: BackingStore<K, V> + Send + 'static,
{
    tokio::spawn(async move {
        debug!("starting expiry sweep task with interval {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.evict_expired_items();

            if removed > 0 {
                debug!("expiry sweep removed {} items", removed);
            } else {
                trace!("expiry sweep found nothing to remove");
            }
        }
    })
}
