//! # Bounded Cache
//!
//! A bounded, time-aware in-memory key/value cache with eviction strategies,
//! per-item TTL and disposal hooks.
//!
//! ## Features
//!
//! - Capacity bound with recency-based or insertion-age-based eviction
//! - Per-item TTL with lazy expiry on retrieval plus a bulk sweep
//! - Disposal hooks that run exactly once when an item leaves the cache
//! - Injectable backing store behind the [`BackingStore`] trait
//! - Thread-safe [`SharedCache`] handle and a tokio background sweep task
//!
//! ## Example
//!
//! ```
//! use bounded_cache::{BoundedCache, CacheConfig, SetOptions};
//!
//! let config = CacheConfig::new().with_maximal_item_count(2);
//! let mut cache = BoundedCache::new(config)?;
//!
//! cache.set("a".to_string(), 1, SetOptions::new());
//! cache.set(
//!     "b".to_string(),
//!     2,
//!     SetOptions::new()
//!         .ttl_millis(5_000)
//!         .dispose(|| println!("b left the cache")),
//! );
//!
//! // Retrieval marks "a" as recently touched
//! assert_eq!(cache.get(&"a".to_string()), Some(&1));
//!
//! // The cache is full, so storing "c" evicts the least recently
//! // touched key ("b") and runs its disposal hook
//! cache.set("c".to_string(), 3, SetOptions::new());
//! assert!(!cache.has(&"b".to_string()));
//! assert_eq!(cache.len(), 2);
//! # Ok::<(), bounded_cache::ConfigError>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod shared;
pub mod tasks;

pub use cache::{
    now_millis, BackingStore, BoundedCache, CacheStats, DisposeFn, InsertionOrderMap, Item,
    RecencyTracker, SetOptions, Timestamp, Ttl,
};
pub use config::{CacheConfig, EvictionStrategy};
pub use error::ConfigError;
pub use shared::SharedCache;
pub use tasks::spawn_sweep_task;
