//! LRU Cache Module
//!
//! Fixed-capacity least-recently-used cache with O(1) lookup, insertion,
//! promotion, eviction and deletion.
//!
//! Entries live in a slot arena (`Vec<Option<Entry>>`) and are chained by
//! slot index:
//! - `head` = most recently used
//! - `tail` = least recently used, next to be evicted
//!
//! Freed slots are recycled through a free list, so the arena never grows
//! past `capacity` slots.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::cache::Entry;
use crate::error::{CacheError, Result};

// == LRU Cache ==
/// Bounded LRU cache mapping keys to values.
pub struct LruCache<K, V> {
    /// Maximum number of resident entries
    capacity: usize,
    /// Key to arena slot
    index: HashMap<K, usize>,
    /// Entry arena, None marks a free slot
    slots: Vec<Option<Entry<K, V>>>,
    /// Recyclable slots
    free: Vec<usize>,
    /// Most recently used slot
    head: Option<usize>,
    /// Least recently used slot
    tail: Option<usize>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero. Use [`LruCache::try_new`] for
    /// user-supplied sizes.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruCache capacity must be greater than 0");
        Self::with_capacity(capacity)
    }

    /// Creates an empty cache, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    // == Insert Or Promote ==
    /// Inserts `key` at the most-recently-used position.
    ///
    /// A resident key has its value overwritten and is moved to the head
    /// without evicting anything. An absent key evicts the tail first when
    /// the cache is full.
    pub fn insert_or_promote(&mut self, key: K, value: V) {
        let _ = self.insert_or_evict(key, value);
    }

    /// Same as [`LruCache::insert_or_promote`], returning the pair evicted
    /// to make room, if any.
    pub fn insert_or_evict(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some(entry) = self.slots[slot].as_mut() {
                entry.value = value;
            }
            self.promote(slot);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let slot = self.alloc(Entry::new(key.clone(), value));
        self.attach_front(slot);
        self.index.insert(key, slot);

        evicted
    }

    // == Lookup ==
    /// Returns the value for `key` and promotes it to most recently used.
    ///
    /// An absent key yields `CacheError::NotFound` and leaves the cache
    /// untouched.
    pub fn lookup<Q>(&mut self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => return Err(CacheError::NotFound(key.to_string())),
        };

        self.promote(slot);

        self.slots[slot]
            .as_ref()
            .map(|entry| &entry.value)
            .ok_or_else(|| CacheError::Invariant(format!("index points at free slot {}", slot)))
    }

    // == Peek ==
    /// Returns the value for `key` without touching recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.slots[slot].as_ref().map(|entry| &entry.value)
    }

    // == Contains ==
    /// Checks whether `key` is resident, without promoting it.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // == Delete ==
    /// Removes `key` from the cache and returns its value.
    ///
    /// An absent key yields `CacheError::NotFound` and leaves the cache
    /// untouched.
    pub fn delete<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let slot = self
            .index
            .remove(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        self.unlink(slot);

        self.release(slot)
            .map(|entry| entry.value)
            .ok_or_else(|| CacheError::Invariant(format!("index points at free slot {}", slot)))
    }

    // == Pop LRU ==
    /// Evicts and returns the least recently used pair.
    ///
    /// Returns None if the cache is empty.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let slot = self.tail?;
        self.unlink(slot);
        let entry = self.release(slot)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    // == Peek LRU ==
    /// Returns the key that would be evicted next.
    pub fn peek_lru(&self) -> Option<&K> {
        let slot = self.tail?;
        self.slots[slot].as_ref().map(|entry| &entry.key)
    }

    // == Chain ==
    /// Returns a snapshot of resident keys, most recently used first.
    pub fn chain(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    // == Iter ==
    /// Iterates resident pairs from head to tail without promoting.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.index.len(),
        }
    }

    // == Clear ==
    /// Drops every entry and resets the chain.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Is Full ==
    /// Returns true once the next new key would evict the tail.
    pub fn is_full(&self) -> bool {
        self.index.len() >= self.capacity
    }

    // == Capacity ==
    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Check Invariants ==
    /// Walks the chain in both directions and verifies it agrees with the
    /// index.
    pub fn check_invariants(&self) -> Result<()> {
        let len = self.index.len();
        if len > self.capacity {
            return Err(CacheError::Invariant(format!(
                "{} entries exceed capacity {}",
                len, self.capacity
            )));
        }
        if self.head.is_none() != self.tail.is_none() || self.head.is_none() != (len == 0) {
            return Err(CacheError::Invariant(
                "head, tail and index disagree on emptiness".to_string(),
            ));
        }
        if self.slots.len() - self.free.len() != len {
            return Err(CacheError::Invariant(format!(
                "{} occupied slots for {} indexed keys",
                self.slots.len() - self.free.len(),
                len
            )));
        }

        // Forward walk
        let mut steps = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            steps += 1;
            if steps > len {
                return Err(CacheError::Invariant(
                    "forward walk exceeds index size".to_string(),
                ));
            }
            let entry = self.slot(slot)?;
            if entry.prev != prev {
                return Err(CacheError::Invariant(format!(
                    "slot {} has a stale prev link",
                    slot
                )));
            }
            if self.index.get(&entry.key) != Some(&slot) {
                return Err(CacheError::Invariant(format!(
                    "slot {} is not indexed under its key",
                    slot
                )));
            }
            prev = Some(slot);
            cursor = entry.next;
        }
        if steps != len || prev != self.tail {
            return Err(CacheError::Invariant(format!(
                "forward walk visited {} of {} entries",
                steps, len
            )));
        }

        // A sole entry is both endpoints and has no neighbors
        if let (1, Some(head)) = (len, self.head) {
            if !self.slot(head)?.is_detached() {
                return Err(CacheError::Invariant(format!(
                    "sole entry in slot {} still has neighbor links",
                    head
                )));
            }
        }

        // Backward walk
        let mut steps = 0;
        let mut cursor = self.tail;
        let mut last = None;
        while let Some(slot) = cursor {
            steps += 1;
            if steps > len {
                return Err(CacheError::Invariant(
                    "backward walk exceeds index size".to_string(),
                ));
            }
            last = Some(slot);
            cursor = self.slot(slot)?.prev;
        }
        if steps != len || last != self.head {
            return Err(CacheError::Invariant(format!(
                "backward walk visited {} of {} entries",
                steps, len
            )));
        }

        Ok(())
    }

    // == Chain Maintenance ==

    fn slot(&self, slot: usize) -> Result<&Entry<K, V>> {
        self.slots
            .get(slot)
            .and_then(|entry| entry.as_ref())
            .ok_or_else(|| CacheError::Invariant(format!("slot {} is free", slot)))
    }

    fn alloc(&mut self, entry: Entry<K, V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Option<Entry<K, V>> {
        let entry = self.slots[slot].take()?;
        self.free.push(slot);
        Some(entry)
    }

    /// Moves an already-linked slot to the head.
    fn promote(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.attach_front(slot);
    }

    /// Links a detached slot in front of the current head.
    fn attach_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }

        match old_head {
            Some(head) => {
                if let Some(entry) = self.slots[head].as_mut() {
                    entry.prev = Some(slot);
                }
            }
            // Empty chain: the new entry is both endpoints
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    /// Detaches a slot, repairing its neighbors or the endpoints.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.slots[slot].as_ref() {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(entry) = self.slots[prev].as_mut() {
                    entry.next = next;
                }
            }
            // Unlinking the head
            None => self.head = next,
        }

        match next {
            Some(next) => {
                if let Some(entry) = self.slots[next].as_mut() {
                    entry.prev = prev;
                }
            }
            // Unlinking the tail
            None => self.tail = prev,
        }

        if let Some(entry) = self.slots[slot].as_mut() {
            entry.prev = None;
            entry.next = None;
        }
    }
}

// == Iterator ==
/// Head-to-tail iterator over resident pairs.
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Entry<K, V>>],
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.slots.get(self.cursor?)?.as_ref()?;
        self.cursor = entry.next;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

// == Display ==
/// Renders the chain as `k1<->k2<->k3`, most recently used first.
impl<K, V> fmt::Display for LruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, _)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("<->")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[LruCache, capacity: {}, len: {}]",
            self.capacity,
            self.index.len()
        )
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, keys: std::ops::Range<u32>) -> LruCache<u32, String> {
        let mut cache = LruCache::new(capacity);
        for k in keys {
            cache.insert_or_promote(k, format!("doc{}", k));
        }
        cache
    }

    #[test]
    fn test_lru_new() {
        let cache: LruCache<u32, u32> = LruCache::new(5);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 5);
        assert!(cache.chain().is_empty());
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_try_new_zero_capacity() {
        let result = LruCache::<u32, u32>::try_new(0);
        assert!(matches!(result, Err(CacheError::InvalidCapacity(0))));
    }

    #[test]
    #[should_panic]
    fn test_lru_new_zero_capacity_panics() {
        let _ = LruCache::<u32, u32>::new(0);
    }

    #[test]
    fn test_lru_roundtrip_scenario() {
        let mut cache = filled(5, 0..10);

        assert_eq!(cache.chain(), vec![9, 8, 7, 6, 5]);

        let value = cache.lookup(&5).unwrap();
        assert_eq!(value, "doc5");
        assert_eq!(cache.chain(), vec![5, 9, 8, 7, 6]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_evicts_first_inserted() {
        let mut cache = filled(3, 0..3);

        let evicted = cache.insert_or_evict(3, "doc3".to_string());

        assert_eq!(evicted, Some((0, "doc0".to_string())));
        assert_eq!(cache.chain(), vec![3, 2, 1]);
        assert!(matches!(cache.lookup(&0), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_lru_single_entry() {
        let mut cache = LruCache::new(1);

        cache.insert_or_promote("a", 1);
        cache.insert_or_promote("b", 2);

        assert_eq!(cache.chain(), vec!["b"]);
        assert!(matches!(cache.lookup("a"), Err(CacheError::NotFound(_))));
        assert_eq!(cache.peek_lru(), Some(&"b"));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_promotion_on_hit() {
        let mut cache = filled(4, 0..4);

        cache.lookup(&1).unwrap();
        assert_eq!(cache.chain()[0], 1);

        // Tail promotion moves the tail pointer to its predecessor
        cache.lookup(&0).unwrap();
        assert_eq!(cache.chain(), vec![0, 1, 3, 2]);
        assert_eq!(cache.peek_lru(), Some(&2));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_promotion_on_insert_overwrites() {
        let mut cache = filled(3, 0..3);

        let evicted = cache.insert_or_evict(0, "fresh".to_string());

        assert_eq!(evicted, None);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.chain(), vec![0, 2, 1]);
        assert_eq!(cache.peek(&0).map(String::as_str), Some("fresh"));
    }

    #[test]
    fn test_lru_lookup_head_is_idempotent() {
        let mut cache = filled(4, 0..4);
        let before = cache.chain();

        for _ in 0..3 {
            cache.lookup(&3).unwrap();
            assert_eq!(cache.chain(), before);
        }
    }

    #[test]
    fn test_lru_lookup_miss_leaves_state() {
        let mut cache = filled(3, 0..3);

        let result = cache.lookup(&42);

        assert_eq!(result.unwrap_err(), CacheError::NotFound("42".to_string()));
        assert_eq!(cache.chain(), vec![2, 1, 0]);
    }

    #[test]
    fn test_lru_peek_and_contains_do_not_promote() {
        let cache = filled(3, 0..3);

        assert!(cache.contains(&0));
        assert_eq!(cache.peek(&0).map(String::as_str), Some("doc0"));
        assert_eq!(cache.chain(), vec![2, 1, 0]);
        assert!(!cache.contains(&9));
        assert_eq!(cache.peek(&9), None);
    }

    #[test]
    fn test_lru_delete_middle() {
        let mut cache = filled(5, 0..5);

        assert_eq!(cache.delete(&2).unwrap(), "doc2");

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.chain(), vec![4, 3, 1, 0]);
        assert!(matches!(cache.lookup(&2), Err(CacheError::NotFound(_))));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_delete_head() {
        let mut cache = filled(3, 0..3);

        cache.delete(&2).unwrap();

        assert_eq!(cache.chain(), vec![1, 0]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_delete_tail() {
        let mut cache = filled(3, 0..3);

        cache.delete(&0).unwrap();

        assert_eq!(cache.chain(), vec![2, 1]);
        assert_eq!(cache.peek_lru(), Some(&1));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_delete_only_entry() {
        let mut cache = filled(3, 0..1);

        cache.delete(&0).unwrap();

        assert!(cache.is_empty());
        assert_eq!(cache.peek_lru(), None);
        cache.check_invariants().unwrap();

        // Cache is usable again after being emptied
        cache.insert_or_promote(7, "doc7".to_string());
        assert_eq!(cache.chain(), vec![7]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_delete_absent() {
        let mut cache = filled(3, 0..3);

        let result = cache.delete(&99);

        assert!(matches!(result, Err(CacheError::NotFound(_))));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.chain(), vec![2, 1, 0]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_slots_are_recycled() {
        let mut cache = filled(3, 0..3);

        cache.delete(&1).unwrap();
        cache.insert_or_promote(10, "doc10".to_string());
        for k in 20..30 {
            cache.insert_or_promote(k, format!("doc{}", k));
        }

        assert_eq!(cache.slots.len(), 3);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_pop_lru() {
        let mut cache = filled(3, 0..3);

        assert_eq!(cache.pop_lru(), Some((0, "doc0".to_string())));
        assert_eq!(cache.pop_lru(), Some((1, "doc1".to_string())));
        assert_eq!(cache.pop_lru(), Some((2, "doc2".to_string())));
        assert_eq!(cache.pop_lru(), None);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = filled(3, 0..3);

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.chain().is_empty());
        assert_eq!(cache.capacity(), 3);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_is_full() {
        let mut cache = filled(2, 0..1);
        assert!(!cache.is_full());

        cache.insert_or_promote(1, "doc1".to_string());
        assert!(cache.is_full());
    }

    #[test]
    fn test_lru_iter_order() {
        let cache = filled(3, 0..3);

        let pairs: Vec<(u32, &str)> = cache.iter().map(|(k, v)| (*k, v.as_str())).collect();

        assert_eq!(pairs, vec![(2, "doc2"), (1, "doc1"), (0, "doc0")]);
    }

    #[test]
    fn test_lru_display_and_debug() {
        let cache = filled(5, 0..3);

        assert_eq!(cache.to_string(), "2<->1<->0");
        assert_eq!(format!("{:?}", cache), "[LruCache, capacity: 5, len: 3]");
    }

    #[test]
    fn test_lru_check_invariants_detects_broken_link() {
        let mut cache = filled(3, 0..3);

        // Point the head at the tail, skipping the interior entry
        let head = cache.head.unwrap();
        let tail = cache.tail;
        cache.slots[head].as_mut().unwrap().next = tail;

        assert!(matches!(
            cache.check_invariants(),
            Err(CacheError::Invariant(_))
        ));
    }

    #[test]
    fn test_lru_check_invariants_detects_linked_sole_entry() {
        let mut cache = filled(3, 0..1);
        cache.check_invariants().unwrap();

        // A sole entry pointing at itself would loop forever when walked
        let head = cache.head.unwrap();
        cache.slots[head].as_mut().unwrap().next = Some(head);

        assert!(matches!(
            cache.check_invariants(),
            Err(CacheError::Invariant(_))
        ));
    }

    #[test]
    fn test_lru_string_keys_borrowed_lookup() {
        let mut cache: LruCache<String, u32> = LruCache::new(2);
        cache.insert_or_promote("users/1".to_string(), 1);

        assert_eq!(*cache.lookup("users/1").unwrap(), 1);
        assert_eq!(cache.delete("users/1").unwrap(), 1);
        assert!(cache.delete("users/1").unwrap_err().is_not_found());
    }
}
