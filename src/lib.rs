//! Docstash - A bounded LRU document cache
//!
//! Keeps recently fetched documents of a collection in a fixed-size,
//! arena-backed LRU cache in front of a backing store.

pub mod cache;
pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod store;

pub use cache::{CacheStats, LruCache};
pub use collection::DocumentCollection;
pub use config::Config;
pub use document::Document;
pub use error::{CacheError, Result};
pub use store::{BackingStore, MemoryStore};
