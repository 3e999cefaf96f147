//! Property-Based Tests for Cache Module
//!
//! Uses proptest to drive the cache through randomized operation sequences
//! under a virtual clock, checking size bounds, internal consistency,
//! statistics, and full behavioral agreement with a naive reference model.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::{BoundedCache, SetOptions};
use crate::config::{CacheConfig, EvictionStrategy};

// == Test Configuration ==
const MODEL_CAPACITY: usize = 3;
const CLOCK_START: u64 = 1_000_000;

// == Strategies ==
/// Generates keys from a small pool so replacement and eviction paths get
/// exercised heavily.
fn pooled_key_strategy() -> impl Strategy<Value = String> {
    (0..8u8).prop_map(|i| format!("k{}", i))
}

/// Generates free-form valid cache keys.
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates per-write TTLs: mostly none or finite, occasionally the
/// rejected zero.
fn ttl_strategy() -> impl Strategy<Value = Option<u64>> {
    prop_oneof![
        3 => Just(None),
        4 => (1..10_000u64).prop_map(Some),
        1 => Just(Some(0)),
    ]
}

/// A single cache operation under the virtual clock.
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, ttl: Option<u64> },
    Get { key: String },
    Delete { key: String },
    Sweep,
    Advance { millis: u64 },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (pooled_key_strategy(), ttl_strategy())
            .prop_map(|(key, ttl)| CacheOp::Set { key, ttl }),
        3 => pooled_key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => pooled_key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Sweep),
        2 => (1..8_000u64).prop_map(|millis| CacheOp::Advance { millis }),
        1 => Just(CacheOp::Clear),
    ]
}

fn simple_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        valid_key_strategy().prop_map(|key| CacheOp::Set { key, ttl: None }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

// == Reference Model ==

struct ModelItem {
    hook_id: usize,
    expires: Option<u64>,
}

/// Naive mirror of the engine: a plain map plus an explicit order vector,
/// front = next eviction victim.
///
/// Under recency-based eviction the order vector is touch order; under
/// age-based eviction it is insertion order and retrievals leave it alone.
struct Model {
    strategy: EvictionStrategy,
    items: HashMap<String, ModelItem>,
    order: Vec<String>,
}

impl Model {
    fn new(strategy: EvictionStrategy) -> Self {
        Self {
            strategy,
            items: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn set(
        &mut self,
        key: String,
        hook_id: usize,
        expires: Option<u64>,
        max: usize,
        expected: &mut [usize],
    ) {
        while self.items.len() >= max {
            let victim = self.order.remove(0);
            let item = self.items.remove(&victim).expect("order and items agree");
            expected[item.hook_id] = 1;
        }

        let replaced = self
            .items
            .insert(key.clone(), ModelItem { hook_id, expires })
            .is_some();
        if replaced {
            // The replaced hook stays at expected 0: it is dropped unfired.
            // Recency order treats the rewrite as a touch; age order keeps
            // the original position.
            if self.strategy == EvictionStrategy::RecencyBased {
                self.order.retain(|k| k != &key);
                self.order.push(key);
            }
        } else {
            self.order.push(key);
        }
    }

    /// Returns the live item's hook id on a hit.
    fn get(&mut self, key: &str, clock: u64, expected: &mut [usize]) -> Option<usize> {
        let (hook_id, expired) = match self.items.get(key) {
            Some(item) => (item.hook_id, item.expires.map_or(false, |e| e <= clock)),
            None => return None,
        };

        if expired {
            self.items.remove(key);
            self.order.retain(|k| k != key);
            expected[hook_id] = 1;
            None
        } else {
            if self.strategy == EvictionStrategy::RecencyBased {
                self.order.retain(|k| k != key);
                self.order.push(key.to_string());
            }
            Some(hook_id)
        }
    }

    fn delete(&mut self, key: &str, expected: &mut [usize]) -> bool {
        match self.items.remove(key) {
            Some(item) => {
                self.order.retain(|k| k != key);
                expected[item.hook_id] = 1;
                true
            }
            None => false,
        }
    }

    fn sweep(&mut self, clock: u64, expected: &mut [usize]) -> usize {
        let expired: Vec<String> = self
            .items
            .iter()
            .filter(|(_, item)| item.expires.map_or(false, |e| e <= clock))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            let item = self.items.remove(key).expect("key just listed");
            self.order.retain(|k| k != key);
            expected[item.hook_id] = 1;
        }
        expired.len()
    }

    fn clear(&mut self) {
        // Hooks of cleared items never fire under the default config
        self.items.clear();
        self.order.clear();
    }
}

/// Runs an operation sequence against both the engine and the model,
/// asserting after every step that size, membership, retrieval results and
/// per-hook disposal counts all agree.
fn check_against_model(
    ops: Vec<CacheOp>,
    strategy: EvictionStrategy,
) -> Result<(), TestCaseError> {
    let config = CacheConfig::new()
        .with_maximal_item_count(MODEL_CAPACITY)
        .with_eviction_strategy(strategy);
    let mut cache: BoundedCache<String, String> =
        BoundedCache::new(config).expect("config is valid");

    let mut model = Model::new(strategy);
    let mut counters: Vec<Arc<AtomicUsize>> = Vec::new();
    let mut expected: Vec<usize> = Vec::new();
    let mut clock = CLOCK_START;

    for op in ops {
        match op {
            CacheOp::Set { key, ttl } => {
                let id = counters.len();
                let counter = Arc::new(AtomicUsize::new(0));
                counters.push(Arc::clone(&counter));
                expected.push(0);

                let mut opts = SetOptions::new().storage_timestamp(clock).dispose(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                if let Some(ms) = ttl {
                    opts = opts.ttl_millis(ms);
                }

                let stored = cache.set(key.clone(), format!("v{}", id), opts);
                let rejected = ttl == Some(0);
                prop_assert_eq!(stored, !rejected, "only zero-TTL writes are rejected");
                if !rejected {
                    let expires = ttl.map(|ms| clock + ms);
                    model.set(key, id, expires, MODEL_CAPACITY, &mut expected);
                }
            }
            CacheOp::Get { key } => {
                let result = cache.get_at(&key, clock).cloned();
                match model.get(&key, clock, &mut expected) {
                    Some(id) => prop_assert_eq!(result, Some(format!("v{}", id))),
                    None => prop_assert_eq!(result, None),
                }
            }
            CacheOp::Delete { key } => {
                let removed = cache.delete(&key);
                prop_assert_eq!(removed, model.delete(&key, &mut expected));
            }
            CacheOp::Sweep => {
                let removed = cache.evict_expired_items_at(clock);
                prop_assert_eq!(removed, model.sweep(clock, &mut expected));
            }
            CacheOp::Advance { millis } => {
                clock += millis;
            }
            CacheOp::Clear => {
                cache.clear();
                model.clear();
            }
        }

        prop_assert!(
            cache.len() <= MODEL_CAPACITY,
            "Cache size {} exceeds bound {}",
            cache.len(),
            MODEL_CAPACITY
        );
        prop_assert_eq!(cache.len(), model.items.len(), "Size diverged from model");
        for i in 0..8u8 {
            let key = format!("k{}", i);
            prop_assert_eq!(
                cache.has(&key),
                model.items.contains_key(&key),
                "Membership of '{}' diverged from model",
                key
            );
        }
        for (id, counter) in counters.iter().enumerate() {
            prop_assert_eq!(
                counter.load(Ordering::SeqCst),
                expected[id],
                "Hook {} fired a wrong number of times",
                id
            );
        }
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of writes, the number of stored items SHALL never
    // exceed the configured bound.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((valid_key_strategy(), ttl_strategy()), 1..200)
    ) {
        let max_items = 50;
        let mut cache: BoundedCache<String, String> = BoundedCache::new(
            CacheConfig::new().with_maximal_item_count(max_items),
        )
        .expect("config is valid");

        for (key, ttl) in entries {
            let mut opts = SetOptions::new();
            if let Some(ms) = ttl {
                opts = opts.ttl_millis(ms);
            }
            cache.set(key, "value".to_string(), opts);
            prop_assert!(
                cache.len() <= max_items,
                "Cache size {} exceeds bound {}",
                cache.len(),
                max_items
            );
        }
    }

    // *For any* sequence of operations, the backing store and the recency
    // tracker SHALL hold exactly the same key set afterwards.
    #[test]
    fn prop_store_and_tracker_stay_consistent(
        ops in prop::collection::vec(cache_op_strategy(), 1..60)
    ) {
        let mut cache: BoundedCache<String, String> = BoundedCache::new(
            CacheConfig::new().with_maximal_item_count(MODEL_CAPACITY),
        )
        .expect("config is valid");
        let mut clock = CLOCK_START;

        for op in ops {
            match op {
                CacheOp::Set { key, ttl } => {
                    let mut opts = SetOptions::new().storage_timestamp(clock);
                    if let Some(ms) = ttl {
                        opts = opts.ttl_millis(ms);
                    }
                    cache.set(key, "value".to_string(), opts);
                }
                CacheOp::Get { key } => {
                    cache.get_at(&key, clock);
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                }
                CacheOp::Sweep => {
                    cache.evict_expired_items_at(clock);
                }
                CacheOp::Advance { millis } => clock += millis,
                CacheOp::Clear => cache.clear(),
            }
            cache.assert_consistent();
        }
    }

    // *For any* sequence of operations on an unbounded cache without TTLs,
    // the statistics SHALL count exactly one hit per successful retrieval
    // and one miss per failed retrieval.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(simple_op_strategy(), 1..50)) {
        let mut cache: BoundedCache<String, String> =
            BoundedCache::new(CacheConfig::new()).expect("config is valid");
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, .. } => {
                    cache.set(key, "value".to_string(), SetOptions::new());
                }
                CacheOp::Get { key } => {
                    match cache.get(&key) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                }
                _ => {}
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_items, cache.len(), "Total items mismatch");
    }

    // *For any* sequence of operations under recency-based eviction, the
    // cache SHALL agree with the reference model on size, membership,
    // retrieval results, and on every disposal hook firing exactly once
    // when (and only when) its item leaves the cache.
    #[test]
    fn prop_matches_model_recency(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        check_against_model(ops, EvictionStrategy::RecencyBased)?;
    }

    // *For any* sequence of operations under insertion-age-based eviction,
    // the same agreement SHALL hold with retrievals leaving the eviction
    // order untouched.
    #[test]
    fn prop_matches_model_age(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        check_against_model(ops, EvictionStrategy::InsertionAgeBased)?;
    }
}

// Property tests for recency-based eviction order
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* set of distinct keys filling the cache to capacity, adding
    // one more key SHALL evict exactly the least recently used entry.
    #[test]
    fn prop_recency_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy()
    ) {
        // Deduplicate keys to ensure we have unique entries
        let unique_keys: Vec<String> = initial_keys
            .into_iter()
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();

        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache: BoundedCache<String, String> = BoundedCache::new(
            CacheConfig::new().with_maximal_item_count(capacity),
        )
        .expect("config is valid");

        // First key written becomes the least recently used
        let oldest_key = unique_keys[0].clone();
        for key in &unique_keys {
            cache.set(key.clone(), format!("value_{}", key), SetOptions::new());
        }

        prop_assert_eq!(cache.len(), capacity, "Cache should be at capacity");

        cache.set(new_key.clone(), "new".to_string(), SetOptions::new());

        prop_assert_eq!(
            cache.len(),
            capacity,
            "Cache should remain at capacity after eviction"
        );
        prop_assert!(
            !cache.has(&oldest_key),
            "Oldest key '{}' should have been evicted",
            oldest_key
        );
        prop_assert!(
            cache.has(&new_key),
            "New key '{}' should exist after insertion",
            new_key
        );
        for key in unique_keys.iter().skip(1) {
            prop_assert!(
                cache.has(key),
                "Key '{}' should still exist (not the oldest)",
                key
            );
        }
    }

    // *For any* retrieval of an existing key, that key SHALL become the
    // most recently used and SHALL NOT be the next eviction candidate.
    #[test]
    fn prop_recency_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy()
    ) {
        // Deduplicate keys
        let unique_keys: Vec<String> = keys
            .into_iter()
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();

        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache: BoundedCache<String, String> = BoundedCache::new(
            CacheConfig::new().with_maximal_item_count(capacity),
        )
        .expect("config is valid");

        for key in &unique_keys {
            cache.set(key.clone(), format!("value_{}", key), SetOptions::new());
        }

        // Touch the current eviction candidate so the next one moves up
        let accessed_key = unique_keys[0].clone();
        let _ = cache.get(&accessed_key);
        let expected_evicted = unique_keys[1].clone();

        cache.set(new_key.clone(), "new".to_string(), SetOptions::new());

        prop_assert!(
            cache.has(&accessed_key),
            "Accessed key '{}' should not be evicted after being touched",
            accessed_key
        );
        prop_assert!(
            !cache.has(&expected_evicted),
            "Key '{}' should have been evicted as it was oldest after access",
            expected_evicted
        );
        prop_assert!(cache.has(&new_key), "New key should exist");
    }
}
