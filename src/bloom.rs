// Copyright (c) 2018 Aleksandr Bezobchuk
// Copyright (c) 2022 Alexis Sellier
//
// Licensed under the MIT license.

//! A Bloom filter over byte strings using double hashing.
use tracing::debug;

use crate::bitvec::BitVec;
use crate::error::{Error, Result};
use crate::hash;
use crate::params::{self, FilterConfig, FilterParams, DEFAULT_ERROR_RATE};

/// Approximate set membership: anything that can record an element and
/// later answer whether it may have been recorded.
pub trait Membership {
    /// Record an element.
    fn add(&mut self, element: &[u8]);
    /// Return `false` if the element was definitely never recorded, `true` if
    /// it may have been.
    fn contains(&self, element: &[u8]) -> bool;
}

/// A Bloom filter over byte strings.
///
/// Elements are given as anything that can be viewed as bytes: strings are
/// hashed through their UTF-8 encoding.
#[derive(Clone, Debug)]
pub struct BloomFilter {
    bits: BitVec,
    config: FilterConfig,
    params: FilterParams,
    inserted: u64,
}

impl BloomFilter {
    /// Return a new Bloom filter with a given approximate item capacity.
    /// The false positive probability is [`DEFAULT_ERROR_RATE`].
    pub fn new(capacity: u64) -> Result<Self> {
        Self::with_rate(capacity, DEFAULT_ERROR_RATE)
    }

    /// Return a new Bloom filter with a given approximate item capacity
    /// and a desired false positive rate.
    pub fn with_rate(capacity: u64, error_rate: f64) -> Result<Self> {
        Self::create(FilterConfig {
            capacity,
            error_rate,
        })
    }

    /// Return a new, empty Bloom filter sized for the given configuration.
    pub fn create(config: FilterConfig) -> Result<Self> {
        let params = params::compute_params(config.capacity, config.error_rate)?;
        let bits = BitVec::try_new(params.bit_length).map_err(|_| Error::InvalidConfiguration {
            capacity: config.capacity,
            error_rate: config.error_rate,
            reason: "bit vector could not be allocated",
        })?;

        debug!(
            capacity = config.capacity,
            error_rate = config.error_rate,
            bits = params.bit_length,
            hashes = params.hash_count,
            "Created Bloom filter"
        );

        Ok(Self {
            bits,
            config,
            params,
            inserted: 0,
        })
    }

    /// Assemble a filter from already-validated parts.
    pub(crate) fn from_parts(
        bits: BitVec,
        config: FilterConfig,
        params: FilterParams,
        inserted: u64,
    ) -> Self {
        debug_assert_eq!(bits.len(), params.bit_length);

        Self {
            bits,
            config,
            params,
            inserted,
        }
    }

    /// Add an element to the filter. Adding the same element twice leaves
    /// the bits unchanged, though it is counted twice by [`BloomFilter::inserted`].
    pub fn add<T: AsRef<[u8]> + ?Sized>(&mut self, element: &T) {
        for index in hash::indices(element.as_ref(), &self.params) {
            self.bits.set(index);
        }
        self.inserted = self.inserted.saturating_add(1);
    }

    /// Return whether or not a given element is likely in the filter. There
    /// is a possibility of a false positive, but a false negative will never
    /// occur.
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

    /// Number of calls to [`BloomFilter::add`]. Informational only.
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Number of bits set.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Estimate the number of distinct elements in the filter from the bits
    /// that are set.
    pub fn estimated_count(&self) -> u64 {
        params::estimate_count(self.bits(), self.hashes(), self.count_ones())
    }

    /// The false positive probability expected at the current number of
    /// insertions. Exceeds the configured rate once more than `capacity`
    /// elements have been added.
    pub fn expected_error_rate(&self) -> f64 {
        params::false_positive_rate(self.bits(), self.hashes(), self.inserted)
    }

    /// Return the underlying bit vector.
    pub fn bitvec(&self) -> &BitVec {
        &self.bits
    }

    /// Return the underlying bytes storage.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_bytes()
    }
}

impl Membership for BloomFilter {
    fn add(&mut self, element: &[u8]) {
        BloomFilter::add(self, element)
    }

    fn contains(&self, element: &[u8]) -> bool {
        BloomFilter::contains(self, element)
    }
}

impl AsRef<[u8]> for BloomFilter {
    fn as_ref(&self) -> &[u8] {
        self.bits.as_bytes()
    }
}

/// Two filters are equal when their configuration and bits are; the
/// insertion counter is not compared.
impl PartialEq for BloomFilter {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits && self.params == other.params && self.config == other.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::iter;

    fn key() -> String {
        let rng = fastrand::Rng::new();
        iter::repeat_with(|| rng.alphanumeric()).take(32).collect()
    }

    fn items(size: usize) -> Vec<String> {
        let mut items = HashSet::<String>::new();
        while items.len() < size {
            items.insert(key());
        }
        items.into_iter().collect()
    }

    #[test]
    fn test_bloom_filter() {
        let n = 1024;
        let items = items(n);
        let mut bf = BloomFilter::new(items.len() as u64).unwrap();

        // Test inclusion.
        for item in items.iter() {
            bf.add(item);

            assert_eq!(
                bf.contains(item),
                true,
                "item {} should result in a positive inclusion",
                item,
            );
        }

        // Test false negatives.
        for item in items.iter() {
            assert_eq!(bf.contains(item), true, "item {} resulted in a false negative", item);
        }
        assert_eq!(bf.inserted(), n as u64);
    }

    #[test]
    fn test_small_scenario() {
        let mut bf = BloomFilter::with_rate(3, 0.1).unwrap();

        bf.add("a");
        bf.add("b");

        assert!(bf.contains("a"));
        assert!(bf.contains("b"));

        let n = 10_000;
        let negatives = (0..n)
            .filter(|i| !bf.contains(&format!("z-{}", i)))
            .count();
        assert!(
            negatives as f64 / n as f64 >= 0.9,
            "only {} of {} unrelated keys were rejected",
            negatives,
            n
        );
    }

    #[test]
    fn test_empty_filter_contains_nothing() {
        let bf = BloomFilter::new(100).unwrap();

        for item in items(100) {
            assert!(!bf.contains(&item));
        }
        assert_eq!(bf.count_ones(), 0);
        assert_eq!(bf.estimated_count(), 0);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut bf = BloomFilter::new(100).unwrap();

        bf.add(b"element");
        let before = bf.clone();
        bf.add(b"element");

        assert_eq!(bf, before);
        assert_eq!(bf.inserted(), 2);
        assert!(bf.count_ones() <= bf.hashes() as usize);
    }

    #[test]
    fn test_bytes_and_str_agree() {
        let mut bf = BloomFilter::new(100).unwrap();

        bf.add("hello");
        assert!(bf.contains(b"hello"));
        assert!(bf.contains(&b"hello".to_vec()));
        assert!(bf.contains(&String::from("hello")));
    }

    #[test]
    fn test_create_rejects_bad_config() {
        assert!(matches!(
            BloomFilter::with_rate(0, 0.01),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            BloomFilter::with_rate(100, 1.0),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_create_unallocatable() {
        // Valid, but needs about 12 PB of bits.
        assert!(matches!(
            BloomFilter::with_rate(10_000_000_000_000_000, 0.01),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_params() {
        let bf = BloomFilter::with_rate(1000, 0.01).unwrap();

        assert_eq!(bf.bits(), 9586);
        assert_eq!(bf.hashes(), 7);
        assert_eq!(bf.as_bytes().len(), 1199);
        assert_eq!(bf.config(), &FilterConfig::new(1000, 0.01).unwrap());
    }

    #[test]
    fn test_estimated_count() {
        let mut bf = BloomFilter::new(4096).unwrap();

        for i in 0..12u16 {
            bf.add(&i.to_be_bytes());
        }
        assert_eq!(bf.estimated_count(), 12);

        for i in 0..2048u16 {
            bf.add(&i.to_be_bytes());
        }
        let estimate = bf.estimated_count();
        assert!(
            (1966..=2130).contains(&estimate),
            "estimate {} too far from 2048",
            estimate
        );
    }

    #[test]
    fn test_expected_error_rate() {
        let mut bf = BloomFilter::with_rate(1000, 0.01).unwrap();
        assert_eq!(bf.expected_error_rate(), 0.);

        for i in 0..1000u32 {
            bf.add(&i.to_be_bytes());
        }
        let at_capacity = bf.expected_error_rate();
        assert!((at_capacity - 0.01).abs() < 0.001, "rate {}", at_capacity);

        for i in 1000..2000u32 {
            bf.add(&i.to_be_bytes());
        }
        assert!(bf.expected_error_rate() > at_capacity);
    }

    #[test]
    fn test_membership_trait() {
        fn check<M: Membership>(mut m: M) {
            m.add(b"present");
            assert!(m.contains(b"present"));
        }
        check(BloomFilter::new(10).unwrap());
    }
}
