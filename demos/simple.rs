//! A small run of the filter in front of a key-value store: count false
//! positives over fresh UUID keys, persist the filter, and show how many
//! store lookups it saves.
use std::collections::HashMap;
use std::time::Instant;

use bloomgate::{Backend, BloomFilter, FilterConfig, Guarded};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// A stand-in for the remote store.
struct MemoryStore(HashMap<String, String>);

impl Backend for MemoryStore {
    type Value = String;
    type Error = std::convert::Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.0.get(key).cloned())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = FilterConfig::new(100_000, 0.01)?;
    let ids: Vec<String> = (0..config.capacity)
        .map(|_| Uuid::new_v4().to_string())
        .collect();

    let mut filter = BloomFilter::create(config)?;
    let start = Instant::now();
    let mut false_positives = 0;

    for id in &ids {
        if filter.contains(id) {
            false_positives += 1;
        }
        filter.add(id);
    }
    let elapsed = start.elapsed();

    let path = std::env::temp_dir().join("bloomgate-demo.bloom");
    filter.save(&path)?;
    let filter = BloomFilter::load(&path)?;
    std::fs::remove_file(&path)?;

    println!("requests: {}", ids.len());
    println!("false positives: {}", false_positives);
    println!("expected error rate: {:.2}%", config.error_rate * 100.);
    println!(
        "actual error rate: {:.4}%",
        false_positives as f64 / ids.len() as f64 * 100.
    );
    println!("filter size: {} bytes", filter.encoded_len());
    println!("filter time: {}ms", elapsed.as_millis());

    // Only every other key is actually stored.
    let store = MemoryStore(
        ids.iter()
            .step_by(2)
            .map(|id| (id.clone(), id.to_uppercase()))
            .collect(),
    );
    let mut guarded = Guarded::new(filter, store);
    for _ in 0..ids.len() {
        guarded.get(&Uuid::new_v4().to_string())?;
    }
    for id in &ids {
        guarded.get(id)?;
    }
    let stats = guarded.stats();

    println!(
        "lookups skipped: {}, hits: {}, misses: {}",
        stats.skipped, stats.hits, stats.misses
    );

    Ok(())
}
