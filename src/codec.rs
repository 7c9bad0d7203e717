// Licensed under the MIT license.

//! On-disk representation of a [`BloomFilter`].
//!
//! A fixed 33-byte header followed by the packed bitmap. Integers and the
//! error rate are big-endian.
//!
//! | Offset | Size | Field                          |
//! |--------|------|--------------------------------|
//! | 0      | 4    | magic, `b"BLMF"`               |
//! | 4      | 1    | format version, `1`            |
//! | 5      | 8    | capacity (`u64`)               |
//! | 13     | 8    | error rate (`f64`)             |
//! | 21     | 8    | bit length, `m` (`u64`)        |
//! | 29     | 4    | hash count, `k` (`u32`)        |
//! | 33     | ⌈m/8⌉ | bitmap, most significant bit first |
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::bitvec::{byte_length, BitVec};
use crate::bloom::BloomFilter;
use crate::error::{Error, Result};
use crate::params::{self, FilterConfig, FilterParams};

/// Identifies a persisted filter.
pub const MAGIC: [u8; 4] = *b"BLMF";
/// Current format version.
pub const VERSION: u8 = 1;
/// Size of the fixed header, in bytes.
pub const HEADER_LEN: usize = 33;

/// Decoded header fields.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Header {
    config: FilterConfig,
    params: FilterParams,
}

impl Header {
    fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];

        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = VERSION;
        buf[5..13].copy_from_slice(&self.config.capacity.to_be_bytes());
        buf[13..21].copy_from_slice(&self.config.error_rate.to_be_bytes());
        buf[21..29].copy_from_slice(&(self.params.bit_length as u64).to_be_bytes());
        buf[29..33].copy_from_slice(&self.params.hash_count.to_be_bytes());

        buf
    }

    fn from_bytes(buf: &[u8; HEADER_LEN]) -> Result<Self> {
        if buf[0..4] != MAGIC {
            return Err(Error::corrupt(format!("bad magic {:02x?}", &buf[0..4])));
        }
        if buf[4] != VERSION {
            return Err(Error::corrupt(format!(
                "unsupported format version {}",
                buf[4]
            )));
        }
        let capacity = u64::from_be_bytes(array(&buf[5..13]));
        let error_rate = f64::from_be_bytes(array(&buf[13..21]));
        let bit_length = u64::from_be_bytes(array(&buf[21..29]));
        let hash_count = u32::from_be_bytes(array(&buf[29..33]));

        let config = FilterConfig::new(capacity, error_rate)
            .map_err(|e| Error::corrupt(format!("bad header: {}", e)))?;
        if bit_length == 0 {
            return Err(Error::corrupt("bit length is zero"));
        }
        if hash_count == 0 {
            return Err(Error::corrupt("hash count is zero"));
        }
        let bit_length = usize::try_from(bit_length)
            .map_err(|_| Error::corrupt(format!("bit length {} is too large", bit_length)))?;

        Ok(Self {
            config,
            params: FilterParams {
                bit_length,
                hash_count,
            },
        })
    }
}

fn array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

/// Total encoded size of a filter with the given number of bits, or `None`
/// if it overflows.
fn encoded_len_for(nbits: usize) -> Option<usize> {
    HEADER_LEN.checked_add(byte_length(nbits))
}

/// Serialize a filter to bytes.
pub fn encode(filter: &BloomFilter) -> Vec<u8> {
    let header = Header {
        config: *filter.config(),
        params: *filter.params(),
    };
    let mut bytes = Vec::with_capacity(HEADER_LEN + filter.as_bytes().len());

    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(filter.as_bytes());

    bytes
}

/// Deserialize a filter from bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<BloomFilter> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::corrupt(format!(
            "{} bytes is shorter than the {} byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }
    let header = Header::from_bytes(&array(&bytes[..HEADER_LEN]))?;
    let expected = encoded_len_for(header.params.bit_length)
        .ok_or_else(|| Error::corrupt("bit length is too large"))?;

    if bytes.len() != expected {
        return Err(Error::corrupt(format!(
            "expected {} bytes for {} bits, got {}",
            expected,
            header.params.bit_length,
            bytes.len()
        )));
    }
    let bits = BitVec::from_bytes(bytes[HEADER_LEN..].to_vec(), header.params.bit_length)?;

    Ok(assemble(header, bits))
}

/// Write a filter to a byte sink.
pub fn write_to<W: Write>(filter: &BloomFilter, mut writer: W) -> Result<()> {
    let header = Header {
        config: *filter.config(),
        params: *filter.params(),
    };
    writer.write_all(&header.to_bytes())?;
    writer.write_all(filter.as_bytes())?;
    writer.flush()?;

    Ok(())
}

/// Read a filter from a byte source. The source must hold exactly one
/// encoded filter and nothing after it.
pub fn read_from<R: Read>(mut reader: R) -> Result<BloomFilter> {
    let mut buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut buf).map_err(truncated)?;

    let header = Header::from_bytes(&buf)?;
    encoded_len_for(header.params.bit_length)
        .ok_or_else(|| Error::corrupt("bit length is too large"))?;

    let nbytes = byte_length(header.params.bit_length);
    let mut bitmap = Vec::new();
    reader
        .by_ref()
        .take(nbytes as u64)
        .read_to_end(&mut bitmap)?;
    if bitmap.len() != nbytes {
        return Err(Error::corrupt(format!(
            "expected {} bitmap bytes, got {}",
            nbytes,
            bitmap.len()
        )));
    }
    let mut rest = [0u8; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(Error::corrupt("trailing bytes after bitmap"));
    }
    let bits = BitVec::from_bytes(bitmap, header.params.bit_length)?;

    Ok(assemble(header, bits))
}

fn truncated(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::corrupt("truncated header")
    } else {
        Error::Io(err)
    }
}

fn assemble(header: Header, bits: BitVec) -> BloomFilter {
    // The insertion counter isn't persisted; seed it from the bits.
    let inserted = params::estimate_count(
        header.params.bit_length,
        header.params.hash_count,
        bits.count_ones(),
    );

    debug!(
        capacity = header.config.capacity,
        bits = header.params.bit_length,
        hashes = header.params.hash_count,
        "Decoded Bloom filter"
    );
    BloomFilter::from_parts(bits, header.config, header.params, inserted)
}

impl BloomFilter {
    /// Serialize this filter. See [`encode`].
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    /// Deserialize a filter. See [`decode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }

    /// Size of this filter once encoded, in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.as_bytes().len()
    }

    /// Write this filter to a file, replacing it if it exists.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;

        write_to(self, BufWriter::new(file))?;
        debug!(path = %path.display(), bytes = self.encoded_len(), "Saved Bloom filter");

        Ok(())
    }

    /// Read a filter from a file written by [`BloomFilter::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let filter = read_from(BufReader::new(file))?;

        debug!(path = %path.display(), bytes = filter.encoded_len(), "Loaded Bloom filter");

        Ok(filter)
    }
}
