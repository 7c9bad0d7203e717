// Licensed under the MIT license.

//! Bit index derivation using double hashing.
//!
//! Two SipHash instantiations with fixed keys give the base hashes
//! H<sub>1</sub> and H<sub>2</sub>; the `i`-th index of an element is
//!
//! g<sub>i</sub>(x) = (H<sub>1</sub>(x) + iH<sub>2</sub>(x)) mod m
//!
//! The keys are fixed so that a filter written by one process can be read
//! by another.
use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use crate::params::FilterParams;

/// Seeds used for SipHash.
const HASHER_SEEDS: [[u8; 16]; 2] = [
    [
        136, 168, 28, 251, 141, 239, 69, 38, 166, 209, 98, 201, 2, 169, 146, 170,
    ],
    [
        103, 236, 177, 212, 54, 11, 66, 5, 194, 86, 6, 254, 82, 93, 203, 37,
    ],
];

/// Compute the two base hashes of an element's bytes.
pub fn base_hashes(element: &[u8]) -> (u64, u64) {
    let mut sip1 = SipHasher13::new_with_key(&HASHER_SEEDS[0]);
    let mut sip2 = SipHasher13::new_with_key(&HASHER_SEEDS[1]);

    sip1.write(element);
    sip2.write(element);

    (sip1.finish(), sip2.finish())
}

/// Return the `hash_count` bit indices of an element, in order.
pub fn indices(element: &[u8], params: &FilterParams) -> Indices {
    let (h1, h2) = base_hashes(element);

    Indices {
        h1,
        h2,
        i: 0,
        nhashes: params.hash_count as u64,
        nbits: params.bit_length as u64,
    }
}

/// Iterator over the bit indices of one element. See [`indices`].
#[derive(Clone, Debug)]
pub struct Indices {
    h1: u64,
    h2: u64,
    i: u64,
    nhashes: u64,
    nbits: u64,
}

impl Iterator for Indices {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.i >= self.nhashes {
            return None;
        }
        let r = self.h1.wrapping_add(self.i.wrapping_mul(self.h2));
        self.i += 1;

        Some((r % self.nbits) as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.nhashes - self.i) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Indices {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn params(bit_length: usize, hash_count: u32) -> FilterParams {
        FilterParams {
            bit_length,
            hash_count,
        }
    }

    #[test]
    fn test_deterministic() {
        let p = params(9586, 7);
        let a: Vec<usize> = indices(b"27f2a19f-c582-462b-8156-20715b10181d", &p).collect();
        let b: Vec<usize> = indices(b"27f2a19f-c582-462b-8156-20715b10181d", &p).collect();

        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn test_base_hashes_differ() {
        let (h1, h2) = base_hashes(b"foo");

        assert_ne!(h1, h2);
        assert_ne!(base_hashes(b"foo"), base_hashes(b"bar"));
    }

    #[test]
    fn test_double_hashing() {
        let p = params(1009, 5);
        let (h1, h2) = base_hashes(b"element");
        let expected: Vec<usize> = (0..5u64)
            .map(|i| (h1.wrapping_add(i.wrapping_mul(h2)) % 1009) as usize)
            .collect();

        assert_eq!(indices(b"element", &p).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_indices_in_range() {
        for nbits in [1, 7, 8, 9, 64, 1000] {
            let p = params(nbits, 11);
            for i in 0..256u32 {
                for index in indices(&i.to_le_bytes(), &p) {
                    assert!(index < nbits, "index {} out of range {}", index, nbits);
                }
            }
        }
    }

    #[test]
    fn test_empty_element() {
        let p = params(100, 3);

        assert_eq!(indices(b"", &p).len(), 3);
    }

    #[test]
    fn test_uniformity() {
        let nbits = 1000;
        let p = params(nbits, 7);
        let mut buckets = [0usize; 10];

        for i in 0..1000 {
            let element = format!("element_{}", i);
            for index in indices(element.as_bytes(), &p) {
                buckets[index / 100] += 1;
            }
        }
        // Roughly 700 per bucket.
        for (i, count) in buckets.iter().enumerate() {
            assert!(
                (350..=1050).contains(count),
                "bucket {} has {} entries",
                i,
                count
            );
        }
    }

    #[test]
    fn test_spread() {
        let p = params(10_000, 7);
        let unique: HashSet<usize> = indices(b"address_0xABCD", &p).collect();

        assert!(unique.len() >= 3);
    }
}
