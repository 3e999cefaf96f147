//! Recency Tracker Module
//!
//! Maintains the least- to most-recently-touched order of live keys for
//! recency-based eviction.
//!
//! Keys live in a doubly-linked list backed by a slab of nodes with a
//! key-to-slot map on the side, so push, touch, delete and pop are all O(1)
//! amortized. Links carry the order; slot indices never shift, so no
//! rebasing happens on removal.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

/// Node in the recency doubly-linked list.
///
/// `prev` points toward the more recently touched neighbor, `next` toward
/// the less recently touched one.
#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency Tracker ==
/// Tracks touch order for recency-based eviction.
///
/// - `head` = most recently touched
/// - `tail` = least recently touched (next eviction candidate)
#[derive(Debug)]
pub struct RecencyTracker<K> {
    /// Key to slab slot lookup
    map: HashMap<K, usize, RandomState>,
    /// Slab of list nodes, None = free slot
    nodes: Vec<Option<Node<K>>>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Slots available for reuse
    free_list: Vec<usize>,
}

impl<K> RecencyTracker<K>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
            nodes: Vec::new(),
            head: None,
            tail: None,
            free_list: Vec::new(),
        }
    }

    // == Push ==
    /// Appends a key as the most recently touched.
    ///
    /// # Returns
    /// - `true` if the key was added
    /// - `false` (no-op) if the key is already tracked; callers that want to
    ///   re-push an existing key delete it first or use [`touch`](Self::touch)
    pub fn push(&mut self, key: K) -> bool {
        if self.map.contains_key(&key) {
            return false;
        }

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.map.insert(key, idx);
        true
    }

    // == Touch ==
    /// Moves an existing key to the most recently touched position.
    ///
    /// # Returns
    /// - `true` if the key was found and moved
    /// - `false` (no-op) if the key is not tracked
    pub fn touch(&mut self, key: &K) -> bool {
        if let Some(&idx) = self.map.get(key) {
            self.move_to_front(idx);
            true
        } else {
            false
        }
    }

    // == Delete ==
    /// Removes a key from the tracker.
    ///
    /// # Returns
    /// The freed slab slot for diagnostics (slots are reused, so the value
    /// carries no ordering meaning), or `None` if the key was not tracked.
    pub fn delete(&mut self, key: &K) -> Option<usize> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.nodes[idx] = None;
        self.free_list.push(idx);
        Some(idx)
    }

    // == Pop Least Recent ==
    /// Removes and returns the least recently touched key.
    ///
    /// Returns None if the tracker is empty.
    pub fn pop_least_recent(&mut self) -> Option<K> {
        let idx = self.tail?;
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free_list.push(idx);
        self.map.remove(&node.key);
        Some(node.key)
    }

    // == Peek Least Recent ==
    /// Returns the least recently touched key without removing it.
    pub fn peek_least_recent(&self) -> Option<&K> {
        let idx = self.tail?;
        self.nodes[idx].as_ref().map(|node| &node.key)
    }

    // == Clear ==
    /// Removes all tracked keys.
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    // == Iterate ==
    /// Iterates keys from least to most recently touched.
    pub fn iter(&self) -> RecencyIter<'_, K> {
        RecencyIter {
            nodes: &self.nodes,
            next: self.tail,
        }
    }

    // == Internal List Operations ==

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already most recent
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}

impl<K> Default for RecencyTracker<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over tracked keys, least to most recently touched.
pub struct RecencyIter<'a, K> {
    nodes: &'a [Option<Node<K>>],
    next: Option<usize>,
}

impl<'a, K> Iterator for RecencyIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.nodes[idx].as_ref()?;
        self.next = node.prev;
        Some(&node.key)
    }
}
