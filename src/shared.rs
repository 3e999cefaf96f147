//! Shared Cache Module
//!
//! Thread-safe handle over [`BoundedCache`] for multi-threaded use.
//!
//! One mutex spans the whole engine, so the store and the recency order can
//! never be observed out of step with each other. Disposal hooks are
//! collected while the lock is held and invoked after it is released: by the
//! time a hook runs its item is fully unlinked, and a hook that re-enters
//! the cache through another handle cannot deadlock.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{
    now_millis, BackingStore, BoundedCache, CacheStats, InsertionOrderMap, Item, SetOptions,
    Timestamp,
};
use crate::config::CacheConfig;
use crate::error::Result;

// == Shared Cache ==
/// Cloneable, thread-safe cache handle.
///
/// All clones point at the same underlying cache. Methods take `&self` and
/// lock internally; value-returning reads clone the value, and
/// [`with_item`](Self::with_item) gives borrowed access when cloning is too
/// expensive.
pub struct SharedCache<K, V, S = InsertionOrderMap<K, V>> {
    inner: Arc<Mutex<BoundedCache<K, V, S>>>,
}

impl<K, V, S> Clone for SharedCache<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a shared cache with the default in-memory backing store.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self::from_cache(BoundedCache::new(config)?))
    }
}

impl<K, V, S> SharedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BackingStore<K, V>,
{
    // == Constructor With Store ==
    /// Creates a shared cache over an injected backing store.
    pub fn with_store(config: CacheConfig, store: S) -> Result<Self> {
        Ok(Self::from_cache(BoundedCache::with_store(config, store)?))
    }

    /// Wraps an already constructed engine in a shared handle.
    pub fn from_cache(cache: BoundedCache<K, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    // == Set ==
    /// Stores a key-value pair; see [`BoundedCache::set`].
    ///
    /// Disposal hooks of any evicted victims run after the lock is
    /// released.
    pub fn set(&self, key: K, value: V, opts: SetOptions) -> bool {
        let (stored, hooks) = {
            let mut cache = self.inner.lock();
            cache.set_deferred(key, value, opts)
        };
        for hook in hooks {
            hook();
        }
        stored
    }

    // == Get ==
    /// Retrieves a clone of the value, expiring the item first if its TTL
    /// has elapsed.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_at(key, now_millis())
    }

    /// Retrieves a clone of the value relative to an explicit reference
    /// timestamp.
    pub fn get_at(&self, key: &K, reference: Timestamp) -> Option<V>
    where
        V: Clone,
    {
        let (value, hook) = {
            let mut cache = self.inner.lock();
            let (item, hook) = cache.get_item_at_deferred(key, reference);
            (item.map(|item| item.value.clone()), hook)
        };
        if let Some(hook) = hook {
            hook();
        }
        value
    }

    // == With Item ==
    /// Runs a closure over the retrieved item without cloning the value.
    ///
    /// Retrieval semantics match [`BoundedCache::get_item`]: an elapsed TTL
    /// removes the item (the closure sees `None`) and a hit touches
    /// recency. The closure runs while the cache lock is held, so it must
    /// not call back into this cache.
    pub fn with_item<R>(&self, key: &K, f: impl FnOnce(Option<&Item<V>>) -> R) -> R {
        self.with_item_at(key, now_millis(), f)
    }

    /// Closure access relative to an explicit reference timestamp.
    pub fn with_item_at<R>(
        &self,
        key: &K,
        reference: Timestamp,
        f: impl FnOnce(Option<&Item<V>>) -> R,
    ) -> R {
        let (result, hook) = {
            let mut cache = self.inner.lock();
            let (item, hook) = cache.get_item_at_deferred(key, reference);
            (f(item), hook)
        };
        if let Some(hook) = hook {
            hook();
        }
        result
    }

    // == Peek ==
    /// Returns a clone of the value without touching recency or expiry.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    // == Has ==
    /// Checks key presence without touching recency or expiry.
    pub fn has(&self, key: &K) -> bool {
        self.inner.lock().has(key)
    }

    // == Delete ==
    /// Removes an item by key; its disposal hook runs after the lock is
    /// released.
    pub fn delete(&self, key: &K) -> bool {
        let (removed, hook) = {
            let mut cache = self.inner.lock();
            cache.delete_deferred(key)
        };
        if let Some(hook) = hook {
            hook();
        }
        removed
    }

    // == Evict Expired ==
    /// Removes every item whose TTL has elapsed, returning the count.
    pub fn evict_expired_items(&self) -> usize {
        self.evict_expired_items_at(now_millis())
    }

    /// Expiry sweep relative to an explicit reference timestamp.
    pub fn evict_expired_items_at(&self, reference: Timestamp) -> usize {
        let (removed, hooks) = {
            let mut cache = self.inner.lock();
            cache.evict_expired_deferred(reference)
        };
        for hook in hooks {
            hook();
        }
        removed
    }

    // == Clear ==
    /// Removes all items; see [`BoundedCache::clear`] for the disposal
    /// behavior.
    pub fn clear(&self) {
        let hooks = {
            let mut cache = self.inner.lock();
            cache.clear_deferred()
        };
        for hook in hooks {
            hook();
        }
    }

    // == Length ==
    /// Returns the current number of items.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    // == Config ==
    /// Returns a copy of the configuration the cache was built with.
    pub fn config(&self) -> CacheConfig {
        self.inner.lock().config().clone()
    }
}
