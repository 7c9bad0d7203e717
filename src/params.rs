// Licensed under the MIT license.

//! Filter sizing.
//!
//! Given the expected number of elements `n` and a target false positive
//! rate `p`, the optimal bit vector length and hash count are
//!
//! m = ⌈-n·ln(p) / ln²2⌉, k = max(1, round((m / n)·ln 2))
use std::f64;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The default false positive probability value, 1%.
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// The default expected element count.
pub const DEFAULT_CAPACITY: u64 = 500_000;

/// `ln` squared.
const LN_SQR: f64 = f64::consts::LN_2 * f64::consts::LN_2;

/// What a filter is being built for: how many elements and how wrong it may be.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Expected number of distinct elements.
    pub capacity: u64,
    /// Target false positive probability, in `(0, 1)`.
    pub error_rate: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            error_rate: DEFAULT_ERROR_RATE,
        }
    }
}

impl FilterConfig {
    /// Create a validated configuration.
    pub fn new(capacity: u64, error_rate: f64) -> Result<Self> {
        let config = Self {
            capacity,
            error_rate,
        };
        config.validate()?;

        Ok(config)
    }

    /// Check that this configuration can produce a filter. Useful after
    /// deserializing a configuration from elsewhere.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason| Error::InvalidConfiguration {
            capacity: self.capacity,
            error_rate: self.error_rate,
            reason,
        };
        if self.capacity == 0 {
            return Err(invalid("capacity must be greater than zero"));
        }
        // Written this way round so that NaN is rejected too.
        if !(self.error_rate > 0. && self.error_rate < 1.) {
            return Err(invalid("error rate must be strictly between 0 and 1"));
        }
        Ok(())
    }
}

/// Parameters derived from a [`FilterConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterParams {
    /// Length of the bit vector (`m`).
    pub bit_length: usize,
    /// Number of indices derived per element (`k`).
    pub hash_count: u32,
}

/// Compute the optimal filter parameters for an expected element count and
/// false positive rate.
pub fn compute_params(capacity: u64, error_rate: f64) -> Result<FilterParams> {
    let config = FilterConfig::new(capacity, error_rate)?;
    let bits = optimal_bits(config.capacity, config.error_rate);

    if !bits.is_finite() || bits >= usize::MAX as f64 {
        return Err(Error::InvalidConfiguration {
            capacity,
            error_rate,
            reason: "bit vector length does not fit in usize",
        });
    }
    let bit_length = bits as usize;
    let hash_count = optimal_hashes(bit_length, capacity);

    Ok(FilterParams {
        bit_length,
        hash_count,
    })
}

/// Return the optimal bit vector size for a Bloom filter given an approximate
/// size and a desired false positive rate, as a float so that callers can
/// detect overflow before narrowing.
fn optimal_bits(capacity: u64, error_rate: f64) -> f64 {
    (-((error_rate.ln() * (capacity as f64)) / LN_SQR)).ceil()
}

/// Return the optimal number of hash functions for a Bloom filter given a
/// bit vector size and an approximate set size.
///
/// Also called `k`.
fn optimal_hashes(nbits: usize, capacity: u64) -> u32 {
    let k = ((nbits as f64 / capacity as f64) * f64::consts::LN_2).round();

    (k as u32).max(1)
}

/// Estimate the number of distinct elements in a filter from the number of
/// bits set.
pub fn estimate_count(nbits: usize, nhashes: u32, nbits_set: usize) -> u64 {
    let nbits = nbits as f64;
    let nbits_set = nbits_set as f64;
    let nhashes = nhashes as f64;
    let count = -(nbits / nhashes) * (1. - (nbits_set / nbits)).ln();

    if count.is_finite() {
        count.round() as u64
    } else {
        u64::MAX
    }
}

/// False positive probability after `n` insertions: `(1 - e^(-kn/m))^k`.
pub fn false_positive_rate(nbits: usize, nhashes: u32, n: u64) -> f64 {
    let exponent = -(nhashes as f64) * (n as f64) / (nbits as f64);

    (1. - exponent.exp()).powi(nhashes as i32)
}
