//! Docstash - A bounded LRU document cache
//!
//! Demo binary: seeds an in-memory collection, replays a skewed read
//! workload through the document cache and prints the cache statistics.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docstash::{Config, Document, DocumentCollection, MemoryStore};

/// Share of reads aimed at the hot set
const HOT_READ_PERCENT: u64 = 80;

/// Main entry point for the docstash demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Seed the backing store
/// 4. Activate the cache (unless disabled) and replay reads
/// 5. Print statistics as JSON
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docstash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_size={}, cache_enabled={}, documents={}, reads={}",
        config.cache_size, config.cache_enabled, config.documents, config.reads
    );

    if config.documents == 0 {
        warn!("No documents to read, nothing to do");
        return Ok(());
    }

    let mut store = MemoryStore::new();
    for i in 0..config.documents {
        let doc = Document::new(format!("doc{}", i))?
            .with_rev(format!("_r{}", i))
            .with_field("position", i as u64);
        store.insert(doc)?;
    }
    info!("Backing store seeded with {} documents", store.len());

    let mut collection = DocumentCollection::new("demo", store);
    if config.cache_enabled {
        collection
            .activate_cache(config.cache_size)
            .context("failed to activate document cache")?;
    }

    let hot_set = (config.cache_size / 2).clamp(1, config.documents) as u64;
    let mut rng = XorShift::new(0x9E37_79B9_7F4A_7C15);
    for _ in 0..config.reads {
        let roll = rng.next_u64();
        let index = if roll % 100 < HOT_READ_PERCENT {
            rng.next_u64() % hot_set
        } else {
            rng.next_u64() % config.documents as u64
        };
        let key = format!("doc{}", index);
        collection
            .get(&key)
            .with_context(|| format!("failed to read {}", key))?;
    }

    let stats = collection.stats();
    info!(
        "Replay complete: hit_rate={:.3}, store_fetches={}",
        stats.hit_rate(),
        collection.store().fetch_count()
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Deterministic xorshift64 generator for reproducible workloads.
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}
