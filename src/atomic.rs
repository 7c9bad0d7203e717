// Licensed under the MIT license.

//! A Bloom filter that can be shared between threads without a lock.
//!
//! Setting a bit is idempotent and commutative, so concurrent `add` calls
//! can interleave freely as long as each bit is set with an atomic `OR`.
//! A `contains` running alongside an `add` of the same element may observe
//! only some of its bits and answer `false`; once `add` returns, the
//! element is always reported as present.
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::bitvec::AtomicBitVec;
use crate::bloom::{BloomFilter, Membership};
use crate::error::{Error, Result};
use crate::hash;
use crate::params::{self, FilterConfig, FilterParams};

/// A Bloom filter whose `add` takes `&self`.
#[derive(Debug)]
pub struct AtomicBloomFilter {
    bits: AtomicBitVec,
    config: FilterConfig,
    params: FilterParams,
    inserted: AtomicU64,
}

impl AtomicBloomFilter {
    /// Return a new, empty filter sized for the given configuration.
    pub fn create(config: FilterConfig) -> Result<Self> {
        let params = params::compute_params(config.capacity, config.error_rate)?;
        let bits =
            AtomicBitVec::try_new(params.bit_length).map_err(|_| Error::InvalidConfiguration {
                capacity: config.capacity,
                error_rate: config.error_rate,
                reason: "bit vector could not be allocated",
            })?;

        debug!(
            capacity = config.capacity,
            error_rate = config.error_rate,
            bits = params.bit_length,
            hashes = params.hash_count,
            "Created atomic Bloom filter"
        );

        Ok(Self {
            bits,
            config,
            params,
            inserted: AtomicU64::new(0),
        })
    }

    /// Add an element to the filter.
    pub fn add<T: AsRef<[u8]> + ?Sized>(&self, element: &T) {
        for index in hash::indices(element.as_ref(), &self.params) {
            self.bits.set(index);
        }
        // Never wraps: a decoded, saturated filter starts the count at `u64::MAX`.
        let _ = self
            .inserted
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(1))
            });
    }

    /// Return whether or not a given element is likely in the filter.
    pub fn contains<T: AsRef<[u8]> + ?Sized>(&self, element: &T) -> bool {
        hash::indices(element.as_ref(), &self.params).all(|index| self.bits.get(index))
    }

    /// The configuration this filter was sized for.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The derived sizing parameters.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Return the number of bits in this filter (`m`).
    pub fn bits(&self) -> usize {
        self.bits.len()
    }

    /// Number of hashes used (`k` parameter).
    pub fn hashes(&self) -> u32 {
        self.params.hash_count
    }

    /// Number of calls to [`AtomicBloomFilter::add`] so far.
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Number of bits set.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Copy the filter into a [`BloomFilter`], eg. to persist it. Adds that
    /// are in flight may be partially captured.
    pub fn snapshot(&self) -> BloomFilter {
        BloomFilter::from_parts(
            self.bits.to_bitvec(),
            self.config,
            self.params,
            self.inserted(),
        )
    }
}

impl From<&BloomFilter> for AtomicBloomFilter {
    fn from(other: &BloomFilter) -> Self {
        Self {
            bits: AtomicBitVec::from(other.bitvec()),
            config: *other.config(),
            params: *other.params(),
            inserted: AtomicU64::new(other.inserted()),
        }
    }
}

impl From<BloomFilter> for AtomicBloomFilter {
    fn from(other: BloomFilter) -> Self {
        Self::from(&other)
    }
}

impl From<&AtomicBloomFilter> for BloomFilter {
    fn from(other: &AtomicBloomFilter) -> Self {
        other.snapshot()
    }
}

impl Membership for AtomicBloomFilter {
    fn add(&mut self, element: &[u8]) {
        AtomicBloomFilter::add(self, element)
    }

    fn contains(&self, element: &[u8]) -> bool {
        AtomicBloomFilter::contains(self, element)
    }
}
