//! Configuration Module
//!
//! Handles loading cache and demo-workload settings from environment variables.

use std::env;

use crate::cache::DEFAULT_CACHE_SIZE;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of documents the cache can hold
    pub cache_size: usize,
    /// Whether collections start with their cache activated
    pub cache_enabled: bool,
    /// Number of documents seeded into the demo store
    pub documents: usize,
    /// Number of reads replayed by the demo workload
    pub reads: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DOCSTASH_CACHE_SIZE` - Cached documents per collection (default: 1000)
    /// - `DOCSTASH_CACHE_ENABLED` - Activate the cache (default: true)
    /// - `DOCSTASH_DOCUMENTS` - Demo dataset size (default: 10000)
    /// - `DOCSTASH_READS` - Demo read count (default: 50000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_size: parse_var("DOCSTASH_CACHE_SIZE").unwrap_or(defaults.cache_size),
            cache_enabled: parse_var("DOCSTASH_CACHE_ENABLED").unwrap_or(defaults.cache_enabled),
            documents: parse_var("DOCSTASH_DOCUMENTS").unwrap_or(defaults.documents),
            reads: parse_var("DOCSTASH_READS").unwrap_or(defaults.reads),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            cache_enabled: true,
            documents: 10_000,
            reads: 50_000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
