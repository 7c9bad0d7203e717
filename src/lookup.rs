// Licensed under the MIT license.

//! Skipping backend lookups for keys a filter has never seen.
//!
//! A [`Guarded`] store pairs a filter with a slow key-value [`Backend`]. Keys
//! the filter rejects are answered locally; only "maybe present" keys reach
//! the backend.
use crate::bloom::Membership;

/// A key-value store that is expensive to query.
pub trait Backend {
    /// Stored value type.
    type Value;
    /// Error returned by the store.
    type Error;

    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Self::Value>, Self::Error>;
}

/// Counters kept by a [`Guarded`] store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardStats {
    /// Lookups answered by the filter alone.
    pub skipped: u64,
    /// Lookups forwarded to the backend that found a value.
    pub hits: u64,
    /// Lookups forwarded to the backend that found nothing, ie. filter false
    /// positives, or keys recorded but never stored.
    pub misses: u64,
}

impl GuardStats {
    /// Fraction of forwarded lookups that found nothing.
    pub fn miss_rate(&self) -> f64 {
        let forwarded = self.hits + self.misses;
        if forwarded == 0 {
            return 0.;
        }
        self.misses as f64 / forwarded as f64
    }
}

/// A backend fronted by a membership filter.
#[derive(Debug)]
pub struct Guarded<M, B> {
    filter: M,
    backend: B,
    stats: GuardStats,
}

impl<M: Membership, B: Backend> Guarded<M, B> {
    /// Front `backend` with `filter`. The filter should already hold every
    /// key present in the backend; keys it doesn't hold are never looked up.
    pub fn new(filter: M, backend: B) -> Self {
        Self {
            filter,
            backend,
            stats: GuardStats::default(),
        }
    }

    /// Record that `key` is present in the backend.
    pub fn insert_key(&mut self, key: &str) {
        self.filter.add(key.as_bytes());
    }

    /// Look a key up, consulting the backend only if the filter says the key
    /// may be present.
    pub fn get(&mut self, key: &str) -> Result<Option<B::Value>, B::Error> {
        if !self.filter.contains(key.as_bytes()) {
            self.stats.skipped += 1;
            return Ok(None);
        }
        let value = self.backend.get(key)?;

        if value.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        Ok(value)
    }

    /// Lookup counters so far.
    pub fn stats(&self) -> GuardStats {
        self.stats
    }

    /// The filter.
    pub fn filter(&self) -> &M {
        &self.filter
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Take the filter and backend back.
    pub fn into_parts(self) -> (M, B) {
        (self.filter, self.backend)
    }
}
