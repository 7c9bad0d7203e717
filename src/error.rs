// Licensed under the MIT license.

//! Error types.
use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by filter construction, bit access and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// The capacity or error rate cannot produce a usable filter.
    #[error("invalid configuration (capacity={capacity}, error_rate={error_rate}): {reason}")]
    InvalidConfiguration {
        /// Configured capacity.
        capacity: u64,
        /// Configured false positive rate.
        error_rate: f64,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A bit index past the end of a bit vector.
    #[error("index out of bounds: the len is {len} but the index is {index}")]
    IndexOutOfRange {
        /// Requested bit index.
        index: usize,
        /// Length of the bit vector, in bits.
        len: usize,
    },

    /// A persisted filter failed validation.
    #[error("corrupt filter data: {0}")]
    CorruptData(String),

    /// Reading or writing the underlying storage failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptData(msg.into())
    }
}
