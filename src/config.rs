//! Configuration Module
//!
//! Construction settings for the cache: default TTL, capacity bound,
//! eviction strategy and clear() disposal behavior.
//!
//! Configuration is validated when the cache is built. An invalid value is
//! rejected with a [`ConfigError`] instead of being corrected, so a running
//! cache always reflects exactly the settings it was given.

use crate::cache::Ttl;
use crate::error::{ConfigError, Result};

// == Eviction Strategy ==
/// How the cache picks a victim when it is full and a new key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// Evict the least recently touched item (touched = stored or
    /// successfully retrieved via get)
    RecencyBased,
    /// Evict the oldest stored item, ignoring retrievals
    InsertionAgeBased,
}

impl Default for EvictionStrategy {
    fn default() -> Self {
        EvictionStrategy::RecencyBased
    }
}

// == Cache Config ==
/// Cache construction settings.
///
/// All values have defaults: an unbounded cache that never expires items,
/// evicts by recency once bounded, and keeps disposal hooks out of `clear`.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied to writes that carry no TTL of their own
    pub default_ttl: Ttl,
    /// Maximum number of items, None = unbounded
    pub maximal_item_count: Option<usize>,
    /// Victim selection when the cache is full
    pub eviction_strategy: EvictionStrategy,
    /// Whether clear() runs the disposal hooks of the items it drops
    pub dispose_on_clear: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Ttl::Forever,
            maximal_item_count: None,
            eviction_strategy: EvictionStrategy::default(),
            dispose_on_clear: false,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL applied to writes without an explicit TTL.
    pub fn with_default_ttl(mut self, ttl: Ttl) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Convenience for `.with_default_ttl(Ttl::Millis(ms))`.
    pub fn with_default_ttl_millis(mut self, ms: u64) -> Self {
        self.default_ttl = Ttl::Millis(ms);
        self
    }

    /// Bounds the cache to at most `max` items.
    ///
    /// A bound of 0 is rejected by [`validate`](Self::validate): a cache
    /// that can hold nothing would evict every write it accepts.
    pub fn with_maximal_item_count(mut self, max: usize) -> Self {
        self.maximal_item_count = Some(max);
        self
    }

    /// Sets the victim selection strategy for a full cache.
    pub fn with_eviction_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.eviction_strategy = strategy;
        self
    }

    /// Makes clear() run the disposal hooks of the items it drops.
    ///
    /// Off by default: clearing empties the cache without treating the
    /// dropped items as evicted.
    pub fn with_dispose_on_clear(mut self, dispose: bool) -> Self {
        self.dispose_on_clear = dispose;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.maximal_item_count == Some(0) {
            return Err(ConfigError::ZeroMaximalItemCount);
        }
        Ok(())
    }
}
