//! Backing Store Module
//!
//! The storage seam of the cache: a map from keys to stored items whose
//! iteration order is the insertion order. The default implementation keeps
//! items in a slab-linked map; callers with their own storage (instrumented,
//! pre-warmed, arena-backed) inject an implementation at construction.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::cache::item::Item;

// == Backing Store Trait ==
/// Key-to-item storage used by the cache engine.
///
/// Implementations must keep iteration in insertion order of the currently
/// stored keys:
///
/// - `insert` of a new key appends it at the back of the order
/// - `insert` of an existing key replaces the item and keeps its position
/// - `remove` followed by `insert` of the same key moves it to the back
/// - `iter` starts at the oldest stored key
///
/// Age-based eviction and the expiry sweep both take the front of `iter` as
/// the oldest item, so a store that breaks this order changes which items
/// get evicted.
pub trait BackingStore<K, V> {
    /// Returns the stored item for a key.
    fn get(&self, key: &K) -> Option<&Item<V>>;

    /// Stores an item under a key, returning the previously stored item.
    fn insert(&mut self, key: K, item: Item<V>) -> Option<Item<V>>;

    /// Removes and returns the item stored under a key.
    fn remove(&mut self, key: &K) -> Option<Item<V>>;

    /// Checks whether a key is stored.
    fn contains_key(&self, key: &K) -> bool;

    /// Returns the number of stored items.
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all stored items.
    fn clear(&mut self);

    /// Iterates stored entries from oldest to newest insertion.
    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Item<V>)> + '_>;
}

/// Slot in the insertion-order linked map.
///
/// `prev` points toward the older neighbor, `next` toward the newer one.
#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    item: Item<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Insertion Order Map ==
/// Default [`BackingStore`]: a hash map whose entries stay iterable in
/// insertion order.
///
/// Same slab technique as the recency tracker, with the list oriented the
/// other way around:
///
/// - `head` = oldest insertion (front of iteration)
/// - `tail` = newest insertion
///
/// Replacing a value touches only the slot, so the key keeps its position;
/// removing from the middle relinks the neighbors in O(1).
#[derive(Debug)]
pub struct InsertionOrderMap<K, V> {
    /// Key to slab slot lookup
    map: HashMap<K, usize, RandomState>,
    /// Slab of entries, None = free slot
    slots: Vec<Option<Slot<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Slots available for reuse
    free_list: Vec<usize>,
}

impl<K, V> InsertionOrderMap<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
            slots: Vec::new(),
            head: None,
            tail: None,
            free_list: Vec::new(),
        }
    }

    // == Internal List Operations ==

    fn push_back(&mut self, key: K, item: Item<V>) {
        let idx = self.alloc_slot();
        self.slots[idx] = Some(Slot {
            key: key.clone(),
            item,
            prev: self.tail,
            next: None,
        });

        if let Some(tail_idx) = self.tail {
            if let Some(tail) = &mut self.slots[tail_idx] {
                tail.next = Some(idx);
            }
        }

        self.tail = Some(idx);
        if self.head.is_none() {
            self.head = Some(idx);
        }

        self.map.insert(key, idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(slot) = &self.slots[idx] {
            (slot.prev, slot.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_slot) = &mut self.slots[prev_idx] {
                    prev_slot.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_slot) = &mut self.slots[next_idx] {
                    next_slot.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(None);
            idx
        }
    }
}

impl<K, V> Default for InsertionOrderMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BackingStore<K, V> for InsertionOrderMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&self, key: &K) -> Option<&Item<V>> {
        let &idx = self.map.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.item)
    }

    fn insert(&mut self, key: K, item: Item<V>) -> Option<Item<V>> {
        if let Some(&idx) = self.map.get(&key) {
            // Replace in place so the key keeps its insertion position
            if let Some(slot) = &mut self.slots[idx] {
                return Some(std::mem::replace(&mut slot.item, item));
            }
        }

        self.push_back(key, item);
        None
    }

    fn remove(&mut self, key: &K) -> Option<Item<V>> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        let slot = self.slots[idx].take()?;
        self.free_list.push(idx);
        Some(slot.item)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &Item<V>)> + '_> {
        Box::new(InsertionOrderIter {
            slots: &self.slots,
            next: self.head,
        })
    }
}

/// Iterator over stored entries, oldest to newest insertion.
struct InsertionOrderIter<'a, K, V> {
    slots: &'a [Option<Slot<K, V>>],
    next: Option<usize>,
}

impl<'a, K, V> Iterator for InsertionOrderIter<'a, K, V> {
    type Item = (&'a K, &'a Item<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let slot = self.slots[idx].as_ref()?;
        self.next = slot.next;
        Some((&slot.key, &slot.item))
    }
}
