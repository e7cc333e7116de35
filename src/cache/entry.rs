//! Cache Entry Module
//!
//! Defines a single resident entry of the recency chain.

// == Entry ==
/// A cached key/value pair plus its links into the recency chain.
///
/// Links are arena slot indices owned by [`LruCache`](super::LruCache);
/// nothing else relinks an entry.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    /// The cache key
    pub key: K,
    /// The cached payload
    pub value: V,
    /// Slot of the more recently used neighbor, None at head
    pub(crate) prev: Option<usize>,
    /// Slot of the less recently used neighbor, None at tail
    pub(crate) next: Option<usize>,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a detached entry (no neighbors).
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }

    // == Is Detached ==
    /// True when the entry has no neighbors, i.e. it is the sole resident
    /// or it has been unlinked.
    pub fn is_detached(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}
