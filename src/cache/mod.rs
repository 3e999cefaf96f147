//! Cache Module
//!
//! Provides the bounded, time-aware key/value cache: capacity enforcement
//! with pluggable eviction strategies, per-item TTL with lazy expiry, and
//! exactly-once disposal hooks.

mod backing;
mod bounded;
mod item;
mod recency;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backing::{BackingStore, InsertionOrderMap};
pub use bounded::BoundedCache;
pub use item::{now_millis, DisposeFn, Item, SetOptions, Timestamp, Ttl};
pub use recency::{RecencyIter, RecencyTracker};
pub use stats::CacheStats;
