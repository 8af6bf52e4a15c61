//! Fixed-capacity recency cache with least-recently-used eviction.
//!
//! Entries live in a slab (`Vec`) of nodes linked into a doubly linked
//! recency list by slot index. A `HashMap` maps each key to its slot, so
//! lookups, promotions and evictions are all O(1). The slab never grows past
//! `capacity`: once full, the tail slot is recycled for the incoming key.

use crate::error::{Result, StoreError};
use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel for "no neighbour" in the recency list.
const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Bounded key/value cache ordered by recency of use.
///
/// `add` on an existing key replaces its value and promotes it. `add` on a new
/// key inserts it as the most recent entry and, if the cache was full, evicts
/// the least recently used one.
///
/// ```rust
/// use driver_store::RecencyCache;
///
/// let mut cache = RecencyCache::new(2)?;
/// assert!(!cache.add(1, "a"));
/// assert!(!cache.add(2, "b"));
/// assert!(cache.add(3, "c")); // evicts 1
/// assert!(!cache.contains(&1));
/// # Ok::<(), driver_store::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecencyCache<K, V> {
    capacity: usize,
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    /// Most recently used slot
    head: usize,
    /// Least recently used slot
    tail: usize,
}

impl<K, V> RecencyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Returns [`StoreError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            head: NIL,
            tail: NIL,
        })
    }

    /// Adds or updates an entry. Returns `true` if an eviction occurred.
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.push(key, value).is_some()
    }

    /// Adds or updates an entry, returning the evicted pair if the cache
    /// overflowed.
    pub fn push(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            self.nodes[slot].value = value;
            self.promote(slot);
            return None;
        }

        if self.nodes.len() < self.capacity {
            let slot = self.nodes.len();
            self.nodes.push(Node {
                key: key.clone(),
                value,
                prev: NIL,
                next: NIL,
            });
            self.index.insert(key, slot);
            self.attach_front(slot);
            return None;
        }

        // Full: recycle the least recently used slot for the new key.
        let slot = self.tail;
        self.detach(slot);
        let node = &mut self.nodes[slot];
        let evicted_key = std::mem::replace(&mut node.key, key.clone());
        let evicted_value = std::mem::replace(&mut node.value, value);
        self.index.remove(&evicted_key);
        self.index.insert(key, slot);
        self.attach_front(slot);

        Some((evicted_key, evicted_value))
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.promote(slot);
        Some(&self.nodes[slot].value)
    }

    /// Returns the value for `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.nodes[slot].value)
    }

    /// Returns the entry that would be evicted next.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.nodes.get(self.tail).map(|node| (&node.key, &node.value))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
            remaining: self.index.len(),
        }
    }

    fn promote(&mut self, slot: usize) {
        if self.head == slot {
            return;
        }
        self.detach(slot);
        self.attach_front(slot);
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = NIL;
    }

    fn attach_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;
        if self.head == NIL {
            self.tail = slot;
        } else {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
    }
}

/// Iterator over cache entries, most recently used first.
pub struct Iter<'a, K, V> {
    nodes: &'a [Node<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cursor)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K, V> IntoIterator for &'a RecencyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys<K: Eq + Hash + Clone, V>(cache: &RecencyCache<K, V>) -> Vec<K> {
        cache.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = RecencyCache::<u32, u32>::new(0);
        assert_eq!(result.err(), Some(StoreError::InvalidCapacity(0)));
    }

    #[test]
    fn test_eviction_order() {
        let mut cache = RecencyCache::new(2).unwrap();
        assert!(!cache.add(1, "a"));
        assert!(!cache.add(2, "b"));
        assert!(cache.add(3, "c"));
        assert!(!cache.contains(&1));
        assert_eq!(keys(&cache), vec![3, 2]);

        assert!(!cache.add(2, "z"));
        assert!(cache.add(4, "d"));
        assert!(!cache.contains(&3));
        assert_eq!(cache.peek(&2), Some(&"z"));
        assert_eq!(keys(&cache), vec![4, 2]);
    }

    #[test]
    fn test_push_returns_evicted_pair() {
        let mut cache = RecencyCache::new(1).unwrap();
        assert_eq!(cache.push("x", 1), None);
        assert_eq!(cache.push("x", 2), None);
        assert_eq!(cache.push("y", 3), Some(("x", 2)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek_lru(), Some((&"y", &3)));
    }

    #[test]
    fn test_get_promotes_and_peek_does_not() {
        let mut cache = RecencyCache::new(3).unwrap();
        cache.add(1, 10);
        cache.add(2, 20);
        cache.add(3, 30);

        assert_eq!(cache.peek(&1), Some(&10));
        assert_eq!(cache.peek_lru(), Some((&1, &10)));

        assert_eq!(cache.get(&1), Some(&10));
        assert_eq!(cache.peek_lru(), Some((&2, &20)));
        assert_eq!(keys(&cache), vec![1, 3, 2]);

        assert!(cache.add(4, 40));
        assert!(!cache.contains(&2));
        assert_eq!(cache.get(&99), None);
    }

    #[test]
    fn test_empty_cache() {
        let cache = RecencyCache::<u8, u8>::new(4).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
        assert_eq!(cache.peek_lru(), None);
        assert_eq!(cache.iter().count(), 0);
    }

    /// Reference model: a plain vector, most recent first.
    fn model_add(model: &mut Vec<(u8, u32)>, capacity: usize, key: u8, value: u32) -> bool {
        if let Some(pos) = model.iter().position(|(k, _)| *k == key) {
            model.remove(pos);
            model.insert(0, (key, value));
            return false;
        }
        model.insert(0, (key, value));
        if model.len() > capacity {
            model.pop();
            return true;
        }
        false
    }

    proptest! {
        #[test]
        fn prop_capacity_never_exceeded(
            capacity in 1usize..8,
            ops in proptest::collection::vec((0u8..16, any::<u32>()), 0..200),
        ) {
            let mut cache = RecencyCache::new(capacity).unwrap();
            for (key, value) in ops {
                cache.add(key, value);
                prop_assert!(cache.len() <= capacity);
                prop_assert_eq!(cache.iter().len(), cache.len());
            }
        }

        #[test]
        fn prop_matches_reference_model(
            capacity in 1usize..6,
            ops in proptest::collection::vec((0u8..10, any::<u32>()), 0..150),
        ) {
            let mut cache = RecencyCache::new(capacity).unwrap();
            let mut model = Vec::new();
            for (key, value) in ops {
                let evicted = cache.add(key, value);
                let expected = model_add(&mut model, capacity, key, value);
                prop_assert_eq!(evicted, expected);
                let actual: Vec<(u8, u32)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(&actual, &model);
            }
        }

        #[test]
        fn prop_updated_key_outlives_older_entries(
            capacity in 1usize..8,
        ) {
            let mut cache = RecencyCache::new(capacity).unwrap();
            for key in 0..capacity as u32 {
                cache.add(key, 0u32);
            }
            // Touching the oldest key moves it to the back of the eviction queue.
            prop_assert!(!cache.add(0, 1));
            for fresh in 0..(capacity as u32 - 1) {
                cache.add(1_000 + fresh, 0);
                prop_assert!(cache.contains(&0));
            }
            prop_assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(0));
            prop_assert_eq!(cache.peek(&0), Some(&1));

            prop_assert!(cache.add(5_000, 0));
            prop_assert!(!cache.contains(&0));
        }
    }
}
