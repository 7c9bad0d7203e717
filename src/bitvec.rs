// Copyright (c) 2020 Helge Wrede, Alexander Schultheiß, Lukas Simon
// Copyright (c) 2022 Alexis Sellier
//
// Licensed under the MIT license.

//! Bit vector functionality.
//!
//! Bits are numbered most-significant-bit first: bit `i` lives in byte `i / 8`
//! under the mask `0x80 >> (i % 8)`. [`BitVec::as_bytes`] is therefore the
//! exact on-disk bitmap.
use std::collections::TryReserveError;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Number of bytes needed to hold `nbits` bits.
pub fn byte_length(nbits: usize) -> usize {
    nbits / 8 + usize::from(nbits % 8 != 0)
}

#[inline]
fn mask(index: usize) -> u8 {
    0x80 >> (index % 8)
}

/// A packed bit vector.
#[derive(Clone, PartialEq, Eq)]
pub struct BitVec {
    bytes: Vec<u8>,
    nbits: usize,
}

impl BitVec {
    /// Create a new, zeroed bit vector of the given length, in bits.
    pub fn new(nbits: usize) -> Self {
        Self {
            nbits,
            bytes: vec![0; byte_length(nbits)],
        }
    }

    /// Create a new, zeroed bit vector, or fail if the storage cannot be
    /// allocated.
    pub fn try_new(nbits: usize) -> std::result::Result<Self, TryReserveError> {
        let nbytes = byte_length(nbits);
        let mut bytes = Vec::new();

        bytes.try_reserve_exact(nbytes)?;
        bytes.resize(nbytes, 0);

        Ok(Self { bytes, nbits })
    }

    /// Rebuild a bit vector of `nbits` bits from its packed bytes.
    ///
    /// Fails if the byte count doesn't match `nbits`, or if any padding bit
    /// past the end of the vector is set.
    pub fn from_bytes(bytes: Vec<u8>, nbits: usize) -> Result<Self> {
        if bytes.len() != byte_length(nbits) {
            return Err(Error::corrupt(format!(
                "expected {} bitmap bytes for {} bits, got {}",
                byte_length(nbits),
                nbits,
                bytes.len()
            )));
        }
        if nbits % 8 != 0 {
            let padding = 0xff >> (nbits % 8);
            if let Some(last) = bytes.last() {
                if last & padding != 0 {
                    return Err(Error::corrupt("padding bits are set"));
                }
            }
        }
        Ok(Self { bytes, nbits })
    }

    /// Get the length in bits of the vector.
    pub fn len(&self) -> usize {
        self.nbits
    }

    /// Check whether this vector is empty, ie. has a length of zero.
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    /// Set a single bit to `1`. Setting a bit that is already set does nothing.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn set(&mut self, index: usize) {
        if let Err(err) = self.try_set(index) {
            panic!("{}", err);
        }
    }

    /// Check whether a bit is set.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn get(&self, index: usize) -> bool {
        match self.try_get(index) {
            Ok(bit) => bit,
            Err(err) => panic!("{}", err),
        }
    }

    /// Set a single bit to `1`, or fail if `index` is out of bounds.
    pub fn try_set(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        self.bytes[index / 8] |= mask(index);

        Ok(())
    }

    /// Check whether a bit is set, or fail if `index` is out of bounds.
    pub fn try_get(&self, index: usize) -> Result<bool> {
        self.check(index)?;

        Ok(self.bytes[index / 8] & mask(index) != 0)
    }

    /// Count the number of `1` bits.
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Count the number of `0` bits.
    pub fn count_zeros(&self) -> usize {
        self.len() - self.count_ones()
    }

    /// Return the underlying bytes storage.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.nbits {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.nbits,
            });
        }
        Ok(())
    }
}

impl From<BitVec> for Vec<u8> {
    fn from(other: BitVec) -> Vec<u8> {
        other.bytes
    }
}

impl Debug for BitVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits: String = (0..self.nbits)
            .map(|i| if self.get(i) { '1' } else { '0' })
            .collect();
        write!(f, "BitVec({})", bits)
    }
}

/// A bit vector that can be written from many threads at once.
///
/// Bits live in 64-bit words; bit `i` is bit `63 - i % 64` of word `i / 64`,
/// so the big-endian bytes of the words are the same bytes a [`BitVec`] of
/// the same contents holds.
pub struct AtomicBitVec {
    words: Box<[AtomicU64]>,
    nbits: usize,
}

impl AtomicBitVec {
    /// Create a new, zeroed bit vector of the given length, in bits.
    pub fn new(nbits: usize) -> Self {
        let nwords = nbits / 64 + usize::from(nbits % 64 != 0);

        Self {
            words: (0..nwords).map(|_| AtomicU64::new(0)).collect(),
            nbits,
        }
    }

    /// Create a new, zeroed bit vector, or fail if the storage cannot be
    /// allocated.
    pub fn try_new(nbits: usize) -> std::result::Result<Self, TryReserveError> {
        let nwords = nbits / 64 + usize::from(nbits % 64 != 0);
        let mut words = Vec::new();

        words.try_reserve_exact(nwords)?;
        words.extend((0..nwords).map(|_| AtomicU64::new(0)));

        Ok(Self {
            words: words.into_boxed_slice(),
            nbits,
        })
    }

    /// Get the length in bits of the vector.
    pub fn len(&self) -> usize {
        self.nbits
    }

    /// Check whether this vector is empty, ie. has a length of zero.
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    /// Atomically set a single bit to `1`.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn set(&self, index: usize) {
        self.assert_in_bounds(index);
        self.words[index / 64].fetch_or(word_mask(index), Ordering::Relaxed);
    }

    /// Check whether a bit is set.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn get(&self, index: usize) -> bool {
        self.assert_in_bounds(index);
        self.words[index / 64].load(Ordering::Relaxed) & word_mask(index) != 0
    }

    /// Count the number of `1` bits.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Copy the current contents into a plain [`BitVec`].
    pub fn to_bitvec(&self) -> BitVec {
        let mut bytes: Vec<u8> = self
            .words
            .iter()
            .flat_map(|w| w.load(Ordering::Relaxed).to_be_bytes())
            .collect();
        bytes.truncate(byte_length(self.nbits));

        BitVec {
            bytes,
            nbits: self.nbits,
        }
    }

    fn assert_in_bounds(&self, index: usize) {
        if index >= self.nbits {
            panic!(
                "{}",
                Error::IndexOutOfRange {
                    index,
                    len: self.nbits
                }
            );
        }
    }
}

#[inline]
fn word_mask(index: usize) -> u64 {
    1 << (63 - index % 64)
}

impl From<&BitVec> for AtomicBitVec {
    fn from(other: &BitVec) -> Self {
        let words = other
            .bytes
            .chunks(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word[..chunk.len()].copy_from_slice(chunk);
                AtomicU64::new(u64::from_be_bytes(word))
            })
            .collect();

        Self {
            words,
            nbits: other.nbits,
        }
    }
}

impl Debug for AtomicBitVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits: String = (0..self.nbits)
            .map(|i| if self.get(i) { '1' } else { '0' })
            .collect();
        write!(f, "AtomicBitVec({})", bits)
    }
}
