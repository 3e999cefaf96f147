//! Cache Item Module
//!
//! Defines the stored record for individual cache items: value, timestamps,
//! optional expiry and the disposal hook that runs when an item leaves the
//! cache.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// == Timestamps ==
/// Unix timestamp in milliseconds.
pub type Timestamp = u64;

/// Returns the current Unix timestamp in milliseconds.
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Time To Live ==
/// How long an item stays retrievable after it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Item expires this many milliseconds after its storage timestamp
    Millis(u64),
    /// Item never expires
    Forever,
}

impl Ttl {
    /// Returns true for a zero-duration TTL.
    ///
    /// A zero TTL describes an item that would be expired the moment it is
    /// stored, so writes carrying one are rejected before touching the cache.
    pub fn is_zero(&self) -> bool {
        matches!(self, Ttl::Millis(0))
    }

    /// Computes the expiry timestamp for an item stored at `storage`.
    ///
    /// # Returns
    /// - `Some(storage + millis)` for a finite TTL (saturating on overflow)
    /// - `None` for `Ttl::Forever`
    pub fn expiry_timestamp(&self, storage: Timestamp) -> Option<Timestamp> {
        match self {
            Ttl::Millis(ms) => Some(storage.saturating_add(*ms)),
            Ttl::Forever => None,
        }
    }
}

// == Disposal Hook ==
/// Cleanup callback attached to an item, consumed when invoked.
///
/// Taking ownership on invocation is what makes "runs at most once" a
/// compile-time guarantee rather than a runtime flag.
pub type DisposeFn = Box<dyn FnOnce() + Send>;

// == Set Options ==
/// Per-write options for [`BoundedCache::set`](crate::BoundedCache::set).
///
/// All fields are optional: a default `SetOptions` stores the item with the
/// cache-wide default TTL, the current wall clock as storage timestamp and
/// no disposal hook.
#[derive(Default)]
pub struct SetOptions {
    pub(crate) ttl: Option<Ttl>,
    pub(crate) storage_timestamp: Option<Timestamp>,
    pub(crate) dispose: Option<DisposeFn>,
}

impl SetOptions {
    /// Creates empty options (cache defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the cache-wide default TTL for this write.
    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Convenience for `.ttl(Ttl::Millis(ms))`.
    pub fn ttl_millis(mut self, ms: u64) -> Self {
        self.ttl = Some(Ttl::Millis(ms));
        self
    }

    /// Stores the item as if written at `timestamp` instead of now.
    ///
    /// Expiry is computed relative to this value, which keeps tests and
    /// replay-style callers fully deterministic.
    pub fn storage_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.storage_timestamp = Some(timestamp);
        self
    }

    /// Attaches a cleanup callback, invoked exactly once when the item
    /// leaves the cache through eviction, expiry or deletion.
    pub fn dispose(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.dispose = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for SetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetOptions")
            .field("ttl", &self.ttl)
            .field("storage_timestamp", &self.storage_timestamp)
            .field("dispose", &self.dispose.is_some())
            .finish()
    }
}

// == Cache Item ==
/// A single stored record: the value plus its lifecycle metadata.
pub struct Item<V> {
    /// The stored value
    pub value: V,
    /// When the item was stored (Unix milliseconds)
    pub storage_timestamp: Timestamp,
    /// When the item stops being retrievable, None = never expires
    pub expire_after_timestamp: Option<Timestamp>,
    /// Cleanup hook, taken exactly once when the item leaves the cache
    dispose: Option<DisposeFn>,
}

impl<V> Item<V> {
    // == Constructor ==
    /// Creates a stored item from its parts.
    ///
    /// Mostly used by the cache itself; public so a pre-filled backing store
    /// can be built for [`BoundedCache::with_store`](crate::BoundedCache::with_store).
    pub fn new(
        value: V,
        storage_timestamp: Timestamp,
        expire_after_timestamp: Option<Timestamp>,
        dispose: Option<DisposeFn>,
    ) -> Self {
        Self {
            value,
            storage_timestamp,
            expire_after_timestamp,
            dispose,
        }
    }

    // == Is Expired ==
    /// Checks whether the item is expired relative to `reference`.
    ///
    /// Boundary condition: an item is expired once the reference time reaches
    /// its expiry timestamp. An item stored at 10000 with a 5000 ms TTL is
    /// still live at 14999 and expired at exactly 15000.
    ///
    /// # Returns
    /// - `true` if the item has an expiry and `expire_after <= reference`
    /// - `false` if the item never expires or its TTL has not elapsed
    pub fn is_expired_at(&self, reference: Timestamp) -> bool {
        match self.expire_after_timestamp {
            Some(expires) => expires <= reference,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds relative to `now`, or None if
    /// the item never expires.
    ///
    /// # Returns
    /// - `Some(0)` if the TTL has elapsed
    /// - `Some(remaining_ms)` if the TTL is still running
    /// - `None` if the item has no expiry
    pub fn remaining_ttl_millis(&self, now: Timestamp) -> Option<u64> {
        self.expire_after_timestamp.map(|expires| {
            if expires > now {
                expires - now
            } else {
                0
            }
        })
    }

    // == Dispose Hook ==
    /// Returns true if a disposal hook is still attached.
    pub fn has_dispose_hook(&self) -> bool {
        self.dispose.is_some()
    }

    /// Detaches the disposal hook, leaving the item without one.
    ///
    /// The cache calls this after unlinking an item so the hook can run with
    /// the item already gone from every internal structure.
    pub(crate) fn take_dispose(&mut self) -> Option<DisposeFn> {
        self.dispose.take()
    }
}

impl<V: fmt::Debug> fmt::Debug for Item<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("value", &self.value)
            .field("storage_timestamp", &self.storage_timestamp)
            .field("expire_after_timestamp", &self.expire_after_timestamp)
            .field("dispose", &self.dispose.is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_item_no_expiry() {
        let item = Item::new("test_value", 1_000, None, None);

        assert_eq!(item.value, "test_value");
        assert!(item.expire_after_timestamp.is_none());
        assert!(!item.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_item_with_expiry() {
        let item = Item::new("test_value", 1_000, Some(2_000), None);

        assert_eq!(item.storage_timestamp, 1_000);
        assert_eq!(item.expire_after_timestamp, Some(2_000));
        assert!(!item.is_expired_at(1_500));
    }

    #[test]
    fn test_expiry_boundary() {
        // Stored at 10000 with a 5000 ms TTL expires exactly at 15000
        let expires = Ttl::Millis(5_000).expiry_timestamp(10_000);
        let item = Item::new("test", 10_000, expires, None);

        assert!(!item.is_expired_at(14_999));
        assert!(item.is_expired_at(15_000));
        assert!(item.is_expired_at(15_001));
    }

    #[test]
    fn test_remaining_ttl_millis() {
        let item = Item::new("test", 10_000, Some(15_000), None);

        assert_eq!(item.remaining_ttl_millis(10_000), Some(5_000));
        assert_eq!(item.remaining_ttl_millis(14_000), Some(1_000));
    }

    #[test]
    fn test_remaining_ttl_no_expiry() {
        let item = Item::new("test", 10_000, None, None);

        assert!(item.remaining_ttl_millis(u64::MAX).is_none());
    }

    #[test]
    fn test_remaining_ttl_elapsed() {
        let item = Item::new("test", 10_000, Some(15_000), None);

        // TTL remaining should be 0 once elapsed
        assert_eq!(item.remaining_ttl_millis(15_000), Some(0));
        assert_eq!(item.remaining_ttl_millis(99_000), Some(0));
    }

    #[test]
    fn test_ttl_forever_has_no_expiry_timestamp() {
        assert_eq!(Ttl::Forever.expiry_timestamp(10_000), None);
        assert!(!Ttl::Forever.is_zero());
    }

    #[test]
    fn test_ttl_zero() {
        assert!(Ttl::Millis(0).is_zero());
        assert!(!Ttl::Millis(1).is_zero());
    }

    #[test]
    fn test_ttl_expiry_saturates() {
        // A huge TTL saturates instead of wrapping around
        assert_eq!(
            Ttl::Millis(u64::MAX).expiry_timestamp(10_000),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_take_dispose_only_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook: DisposeFn = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut item = Item::new("test", 1_000, None, Some(hook));
        assert!(item.has_dispose_hook());

        let first = item.take_dispose();
        assert!(first.is_some());
        assert!(!item.has_dispose_hook());

        // Second take yields nothing, so the hook cannot run twice
        assert!(item.take_dispose().is_none());

        first.unwrap()();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_options_defaults() {
        let opts = SetOptions::new();

        assert!(opts.ttl.is_none());
        assert!(opts.storage_timestamp.is_none());
        assert!(opts.dispose.is_none());
    }

    #[test]
    fn test_set_options_builder() {
        let opts = SetOptions::new()
            .ttl_millis(5_000)
            .storage_timestamp(10_000)
            .dispose(|| {});

        assert_eq!(opts.ttl, Some(Ttl::Millis(5_000)));
        assert_eq!(opts.storage_timestamp, Some(10_000));
        assert!(opts.dispose.is_some());
    }

    #[test]
    fn test_now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }
}
