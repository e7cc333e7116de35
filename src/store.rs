//! Backing Store Module
//!
//! The system of record a collection falls back to on a cache miss.

use std::cell::Cell;
use std::collections::HashMap;

use crate::document::{validate_key, Document};
use crate::error::{CacheError, Result};

// == Backing Store ==
/// Fetch-by-key access to the documents of one collection.
pub trait BackingStore {
    /// Fetches a document, optionally pinned to a revision.
    fn fetch(&self, key: &str, rev: Option<&str>) -> Result<Document>;

    /// Removes a document and returns it.
    fn remove(&mut self, key: &str) -> Result<Document>;
}

// == Memory Store ==
/// In-process backing store, used by the demo binary and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<String, Document>,
    /// Number of fetch calls served, hits and failures alike
    fetches: Cell<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document, replacing any previous one with the same key.
    pub fn insert(&mut self, document: Document) -> Result<()> {
        validate_key(&document.key)?;
        self.documents.insert(document.key.clone(), document);
        Ok(())
    }

    /// Number of `fetch` calls made so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.get()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl BackingStore for MemoryStore {
    fn fetch(&self, key: &str, rev: Option<&str>) -> Result<Document> {
        self.fetches.set(self.fetches.get() + 1);

        let doc = self
            .documents
            .get(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        if let Some(expected) = rev {
            let found = doc.rev.as_deref().unwrap_or_default();
            if found != expected {
                return Err(CacheError::RevisionMismatch {
                    key: key.to_string(),
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        Ok(doc.clone())
    }

    fn remove(&mut self, key: &str) -> Result<Document> {
        self.documents
            .remove(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }
}
