//! Cache Module
//!
//! Bounded LRU cache for fetched documents.

mod entry;
mod lru;
mod stats;


// Re-export public types
pub(crate) use entry::Entry;
pub use lru::{Iter, LruCache};
pub use stats::CacheStats;

// == Public Constants ==
/// Cache size used when none is configured
pub const DEFAULT_CACHE_SIZE: usize = 1000;
