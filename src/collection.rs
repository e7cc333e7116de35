//! Collection Module
//!
//! Keyed document access for one collection, with an optional LRU cache in
//! front of the backing store.

use tracing::{debug, trace};

use crate::cache::{CacheStats, LruCache};
use crate::document::{validate_key, Document};
use crate::error::{CacheError, Result};
use crate::store::BackingStore;

// == Document Collection ==
/// A named collection reading through an optional document cache.
///
/// The cache is inactive until [`DocumentCollection::activate_cache`] is
/// called. Only [`DocumentCollection::get`] consults it;
/// [`DocumentCollection::fetch_document`] always goes to the store.
#[derive(Debug)]
pub struct DocumentCollection<S> {
    /// Collection name, used for `_id` handles
    name: String,
    /// System of record
    store: S,
    /// Document cache, None while inactive
    cache: Option<LruCache<String, Document>>,
    /// Cache effectiveness counters
    stats: CacheStats,
}

impl<S: BackingStore> DocumentCollection<S> {
    // == Constructor ==
    /// Creates a collection with its cache deactivated.
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            store,
            cache: None,
            stats: CacheStats::new(),
        }
    }

    // == Cache Lifecycle ==
    /// Activates caching with room for `size` documents.
    ///
    /// Replaces any existing cache with an empty one and resets the stats.
    pub fn activate_cache(&mut self, size: usize) -> Result<()> {
        self.cache = Some(LruCache::try_new(size)?);
        self.stats = CacheStats::new();
        debug!(collection = %self.name, size, "document cache activated");
        Ok(())
    }

    /// Drops the cache and every document it holds.
    pub fn deactivate_cache(&mut self) {
        if let Some(cache) = self.cache.take() {
            debug!(collection = %self.name, dropped = cache.len(), "document cache deactivated");
        }
        self.stats.set_total_entries(0);
    }

    pub fn is_cache_active(&self) -> bool {
        self.cache.is_some()
    }

    /// Returns the cache capacity, or None while inactive.
    pub fn cache_capacity(&self) -> Option<usize> {
        self.cache.as_ref().map(LruCache::capacity)
    }

    /// Returns cached keys, most recently used first.
    pub fn cached_keys(&self) -> Vec<String> {
        self.cache.as_ref().map(LruCache::chain).unwrap_or_default()
    }

    // == Fetch Document ==
    /// Fetches a document straight from the store, bypassing the cache.
    pub fn fetch_document(&self, key: &str, rev: Option<&str>) -> Result<Document> {
        validate_key(key)?;
        let mut doc = self.store.fetch(key, rev)?;
        doc.bind(&self.name);
        Ok(doc)
    }

    // == Get ==
    /// Returns a document, serving it from the cache when possible.
    ///
    /// On a miss the document is fetched from the store and cached. With the
    /// cache inactive this is equivalent to `fetch_document(key, None)`.
    pub fn get(&mut self, key: &str) -> Result<Document> {
        if self.cache.is_none() {
            return self.fetch_document(key, None);
        }

        if let Some(cache) = self.cache.as_mut() {
            if let Ok(doc) = cache.lookup(key) {
                trace!(collection = %self.name, key, "cache hit");
                self.stats.record_hit();
                return Ok(doc.clone());
            }
        }

        trace!(collection = %self.name, key, "cache miss");
        self.stats.record_miss();
        let doc = self.fetch_document(key, None)?;
        self.cache_document(doc.clone());
        Ok(doc)
    }

    // == Refresh ==
    /// Inserts or refreshes a document in the cache without touching the
    /// store. Does nothing while the cache is inactive.
    pub fn refresh(&mut self, mut document: Document) -> Result<()> {
        validate_key(&document.key)?;
        document.bind(&self.name);
        self.cache_document(document);
        Ok(())
    }

    // == Delete Document ==
    /// Removes a document from the store and drops any cached copy.
    ///
    /// The cached copy is dropped even when the store fails, so a document
    /// the store no longer has is never served again.
    pub fn delete_document(&mut self, key: &str) -> Result<Document> {
        validate_key(key)?;

        match self.invalidate(key) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let mut doc = self.store.remove(key)?;
        doc.bind(&self.name);
        Ok(doc)
    }

    // == Invalidate ==
    /// Drops a cached document without touching the store.
    ///
    /// Returns `CacheError::NotFound` if the document is not cached or the
    /// cache is inactive.
    pub fn invalidate(&mut self, key: &str) -> Result<Document> {
        let cache = match self.cache.as_mut() {
            Some(cache) => cache,
            None => return Err(CacheError::NotFound(key.to_string())),
        };

        let doc = cache.delete(key)?;
        self.stats.record_invalidation();
        self.stats.set_total_entries(cache.len());
        debug!(collection = %self.name, key, "cached document invalidated");
        Ok(doc)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.cache.as_ref().map_or(0, LruCache::len));
        stats
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn cache_document(&mut self, document: Document) {
        let Some(cache) = self.cache.as_mut() else {
            return;
        };

        if let Some((evicted, _)) = cache.insert_or_evict(document.key.clone(), document) {
            trace!(collection = %self.name, key = %evicted, "evicted least recently used document");
            self.stats.record_eviction();
        }
        self.stats.set_total_entries(cache.len());
    }
}
