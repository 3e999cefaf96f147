//! Bounded Cache Module
//!
//! Main cache engine combining the backing store with recency tracking,
//! capacity enforcement, TTL expiry and disposal hooks.
//!
//! The engine is single-threaded: every mutating operation takes `&mut self`
//! and completes atomically from the caller's point of view. Thread-safe
//! access goes through [`SharedCache`](crate::SharedCache), which wraps the
//! whole engine in one lock.

use std::hash::Hash;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::cache::backing::{BackingStore, InsertionOrderMap};
use crate::cache::item::{now_millis, DisposeFn, Item, SetOptions, Timestamp};
use crate::cache::recency::RecencyTracker;
use crate::cache::stats::CacheStats;
use crate::config::{CacheConfig, EvictionStrategy};
use crate::error::Result;

// == Bounded Cache ==
/// Bounded, time-aware key/value cache.
///
/// Holds at most `maximal_item_count` items (when bounded), expires items
/// whose TTL has elapsed, and runs each item's disposal hook exactly once
/// when the item leaves through eviction, expiry or deletion. The backing
/// store `S` defaults to the in-memory [`InsertionOrderMap`]; anything
/// implementing [`BackingStore`] can be injected instead.
#[derive(Debug)]
pub struct BoundedCache<K, V, S = InsertionOrderMap<K, V>> {
    /// Key-to-item storage, iterable oldest insertion first
    store: S,
    /// Least- to most-recently-touched order of the same keys
    recency: RecencyTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Validated construction settings
    config: CacheConfig,
    /// Values live in the store `S`; this ties `V` to the struct
    _values: PhantomData<V>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a cache with the default in-memory backing store.
    ///
    /// # Errors
    /// Returns a [`ConfigError`](crate::ConfigError) if the configuration is
    /// invalid.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_store(config, InsertionOrderMap::new())
    }
}

impl<K, V, S> BoundedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BackingStore<K, V>,
{
    // == Constructor With Store ==
    /// Creates a cache over an injected backing store.
    ///
    /// Items already present in the store are adopted: the recency order is
    /// seeded from the store's insertion order, oldest item least recent.
    /// An adopted store larger than the capacity bound is not trimmed here;
    /// the next `set` evicts down through the normal path.
    pub fn with_store(config: CacheConfig, store: S) -> Result<Self> {
        config.validate()?;

        let mut recency = RecencyTracker::new();
        for (key, _) in store.iter() {
            recency.push(key.clone());
        }

        let mut stats = CacheStats::new();
        stats.set_total_items(store.len());

        Ok(Self {
            store,
            recency,
            stats,
            config,
            _values: PhantomData,
        })
    }

    // == Set ==
    /// Stores a key-value pair, evicting as needed to respect the capacity
    /// bound.
    ///
    /// The effective TTL is the one in `opts`, or the cache-wide default.
    /// A zero TTL makes the write a no-op: such an item would already be
    /// expired at its own storage timestamp, so it is rejected before any
    /// eviction work happens.
    ///
    /// While the cache is at or above capacity, victims are evicted one at
    /// a time per the configured strategy; when the stored key itself is the
    /// current victim it gets evicted (and disposed) like any other before
    /// the new value goes in. Overwriting a live key replaces its value and
    /// drops the prior disposal hook without running it; delete first when
    /// the old value's cleanup must happen.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `opts` - Per-write TTL, storage timestamp and disposal hook
    ///
    /// # Returns
    /// `true` if the item was stored, `false` if the write was rejected.
    pub fn set(&mut self, key: K, value: V, opts: SetOptions) -> bool {
        let (stored, hooks) = self.set_deferred(key, value, opts);
        for hook in hooks {
            hook();
        }
        stored
    }

    pub(crate) fn set_deferred(
        &mut self,
        key: K,
        value: V,
        opts: SetOptions,
    ) -> (bool, Vec<DisposeFn>) {
        let SetOptions {
            ttl,
            storage_timestamp,
            dispose,
        } = opts;

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if ttl.is_zero() {
            trace!("rejected write with zero TTL");
            return (false, Vec::new());
        }

        let storage_timestamp = storage_timestamp.unwrap_or_else(now_millis);
        let expire_after_timestamp = ttl.expiry_timestamp(storage_timestamp);

        // Make room before inserting
        let mut hooks = Vec::new();
        if let Some(max) = self.config.maximal_item_count {
            while self.store.len() >= max {
                if !self.evict_victim(&mut hooks) {
                    break;
                }
            }
        }

        let item = Item::new(value, storage_timestamp, expire_after_timestamp, dispose);
        let was_present = self.store.insert(key.clone(), item).is_some();
        if was_present {
            // Replaced item dropped above, hook unfired
            self.recency.touch(&key);
        } else {
            self.recency.push(key);
        }

        self.stats.set_total_items(self.store.len());
        (true, hooks)
    }

    // == Peek ==
    /// Returns the stored value without touching recency or expiry.
    ///
    /// An expired item is still visible here until a retrieval or sweep
    /// removes it.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.store.get(key).map(|item| &item.value)
    }

    // == Peek Item ==
    /// Returns the full stored item without touching recency or expiry.
    pub fn peek_item(&self, key: &K) -> Option<&Item<V>> {
        self.store.get(key)
    }

    // == Get ==
    /// Retrieves a value, expiring it first if its TTL has elapsed.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_at(key, now_millis())
    }

    /// Retrieves a value relative to an explicit reference timestamp.
    pub fn get_at(&mut self, key: &K, reference: Timestamp) -> Option<&V> {
        self.get_item_at(key, reference).map(|item| &item.value)
    }

    // == Get Item ==
    /// Retrieves the full stored item, expiring it first if its TTL has
    /// elapsed.
    pub fn get_item(&mut self, key: &K) -> Option<&Item<V>> {
        self.get_item_at(key, now_millis())
    }

    /// Retrieves the full stored item relative to an explicit reference
    /// timestamp.
    ///
    /// An item whose expiry timestamp is at or before `reference` is
    /// removed, its disposal hook runs, and the lookup reports `None`. On a
    /// hit the key becomes the most recently touched.
    pub fn get_item_at(&mut self, key: &K, reference: Timestamp) -> Option<&Item<V>> {
        let (item, hook) = self.get_item_at_deferred(key, reference);
        if let Some(hook) = hook {
            hook();
        }
        item
    }

    pub(crate) fn get_item_at_deferred(
        &mut self,
        key: &K,
        reference: Timestamp,
    ) -> (Option<&Item<V>>, Option<DisposeFn>) {
        let expired = match self.store.get(key) {
            Some(item) => item.is_expired_at(reference),
            None => {
                self.stats.record_miss();
                return (None, None);
            }
        };

        if expired {
            // Unlink first so the hook runs with the item already gone
            let hook = self
                .remove_item(key)
                .and_then(|mut item| item.take_dispose());
            self.stats.record_expiration();
            self.stats.record_miss();
            self.stats.set_total_items(self.store.len());
            trace!("lazy expiry removed item during retrieval");
            return (None, hook);
        }

        self.recency.touch(key);
        self.stats.record_hit();
        (self.store.get(key), None)
    }

    // == Has ==
    /// Checks key presence without touching recency or expiry.
    pub fn has(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }

    // == Delete ==
    /// Removes an item by key, running its disposal hook.
    ///
    /// The item is unlinked from both internal structures before the hook
    /// runs.
    ///
    /// # Returns
    /// `true` if the key was present.
    pub fn delete(&mut self, key: &K) -> bool {
        let (removed, hook) = self.delete_deferred(key);
        if let Some(hook) = hook {
            hook();
        }
        removed
    }

    pub(crate) fn delete_deferred(&mut self, key: &K) -> (bool, Option<DisposeFn>) {
        match self.remove_item(key) {
            Some(mut item) => {
                self.stats.set_total_items(self.store.len());
                (true, item.take_dispose())
            }
            None => (false, None),
        }
    }

    // == Evict Expired ==
    /// Removes every item whose TTL has elapsed.
    ///
    /// Returns the number of items removed.
    pub fn evict_expired_items(&mut self) -> usize {
        self.evict_expired_items_at(now_millis())
    }

    /// Removes every item expired relative to an explicit reference
    /// timestamp, oldest insertion first.
    pub fn evict_expired_items_at(&mut self, reference: Timestamp) -> usize {
        let (removed, hooks) = self.evict_expired_deferred(reference);
        for hook in hooks {
            hook();
        }
        removed
    }

    pub(crate) fn evict_expired_deferred(
        &mut self,
        reference: Timestamp,
    ) -> (usize, Vec<DisposeFn>) {
        let expired_keys: Vec<K> = self
            .store
            .iter()
            .filter(|(_, item)| item.is_expired_at(reference))
            .map(|(key, _)| key.clone())
            .collect();

        let mut hooks = Vec::new();
        for key in &expired_keys {
            if let Some(mut item) = self.remove_item(key) {
                if let Some(hook) = item.take_dispose() {
                    hooks.push(hook);
                }
                self.stats.record_expiration();
            }
        }

        let removed = expired_keys.len();
        if removed > 0 {
            self.stats.set_total_items(self.store.len());
            debug!("expiry sweep removed {} items", removed);
        }
        (removed, hooks)
    }

    // == Clear ==
    /// Removes all items unconditionally.
    ///
    /// Disposal hooks run only when the cache was configured with
    /// `dispose_on_clear`; by default clearing drops items without treating
    /// them as evicted. Clearing an empty cache is a no-op.
    pub fn clear(&mut self) {
        for hook in self.clear_deferred() {
            hook();
        }
    }

    pub(crate) fn clear_deferred(&mut self) -> Vec<DisposeFn> {
        let mut hooks = Vec::new();
        if self.config.dispose_on_clear {
            let keys: Vec<K> = self.store.iter().map(|(key, _)| key.clone()).collect();
            for key in &keys {
                if let Some(mut item) = self.store.remove(key) {
                    if let Some(hook) = item.take_dispose() {
                        hooks.push(hook);
                    }
                }
            }
        }

        self.store.clear();
        self.recency.clear();
        self.stats.set_total_items(0);
        hooks
    }

    // == Length ==
    /// Returns the current number of items in the cache.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_items(self.store.len());
        stats
    }

    // == Config ==
    /// Returns the configuration the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Internal ==

    /// Removes one victim per the configured strategy, pushing its disposal
    /// hook (if any) onto `hooks`. Returns false when the cache is empty.
    fn evict_victim(&mut self, hooks: &mut Vec<DisposeFn>) -> bool {
        let victim = match self.config.eviction_strategy {
            EvictionStrategy::RecencyBased => self.recency.pop_least_recent(),
            EvictionStrategy::InsertionAgeBased => {
                let key = self.store.iter().next().map(|(key, _)| key.clone());
                if let Some(ref key) = key {
                    self.recency.delete(key);
                }
                key
            }
        };

        match victim {
            Some(key) => {
                if let Some(mut item) = self.store.remove(&key) {
                    if let Some(hook) = item.take_dispose() {
                        hooks.push(hook);
                    }
                }
                self.stats.record_eviction();
                trace!("capacity eviction removed 1 item");
                true
            }
            None => false,
        }
    }

    /// Removes an item from both internal structures, keeping them
    /// consistent. Does not touch stats or run hooks.
    fn remove_item(&mut self, key: &K) -> Option<Item<V>> {
        let item = self.store.remove(key)?;
        self.recency.delete(key);
        Some(item)
    }

    /// Panics unless the store and the recency tracker hold exactly the
    /// same key set.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(
            self.store.len(),
            self.recency.len(),
            "store and recency tracker disagree on size"
        );
        for (key, _) in self.store.iter() {
            assert!(
                self.recency.contains(key),
                "stored key missing from recency tracker"
            );
        }
    }
}
