//! A persistent Bloom filter, used to avoid lookups against a slow key-value
//! store for keys that were never stored.
//!
//! # Bloom Filters
//!
//! A Bloom filter is a space-efficient probabilistic data structure that is
//! used to test whether an element is a member of a set. It allows for queries
//! to return: "possibly in set" or "definitely not in set". Elements can be
//! added to the set, but not removed; the more elements that are added to the
//! set, the larger the probability of false positives. Once more than the
//! configured capacity has been inserted, the false positive rate climbs past
//! the configured one.
//!
//! Filters are sized from an expected element count and a target false
//! positive rate (see [`params`]), and hash raw bytes: a string key is hashed
//! through its UTF-8 encoding.
//!
//! # Double Hashing
//!
//! Each element is hashed twice with SipHash, under two fixed keys, and the
//! `k` bit positions are derived from the pair as
//!
//! g<sub>i</sub>(x) = (H<sub>1</sub>(x) + iH<sub>2</sub>(x)) mod m
//!
//! following Kirsch and Mitzenmacher, *Less Hashing, Same Performance:
//! Building a Better Bloom Filter*.
//!
//! # Persistence
//!
//! Filters can be written to and read back from bytes or files in a small
//! self-describing format; see [`codec`].
//!
//! # Example
//!
//! ```
//! use bloomgate::BloomFilter;
//!
//! let mut filter = BloomFilter::with_rate(32, 0.01)?;
//!
//! filter.add("foo");
//! filter.add("bar");
//!
//! assert!(filter.contains("foo"));
//! assert!(filter.contains("bar"));
//!
//! let bytes = filter.encode();
//! let restored = BloomFilter::decode(&bytes)?;
//!
//! assert_eq!(restored, filter);
//! # Ok::<(), bloomgate::Error>(())
//! ```
#![warn(missing_docs)]
#![allow(clippy::bool_assert_comparison)]

pub mod atomic;
pub mod bitvec;
pub mod bloom;
pub mod codec;
pub mod error;
pub mod hash;
pub mod lookup;
pub mod params;

pub use atomic::AtomicBloomFilter;
pub use bloom::{BloomFilter, Membership};
pub use error::{Error, Result};
pub use lookup::{Backend, GuardStats, Guarded};
pub use params::{compute_params, FilterConfig, FilterParams, DEFAULT_ERROR_RATE};
