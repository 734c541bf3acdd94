///! # Bloom Filter
///!
///! A space-efficient probabilistic data structure for set membership testing.
///!
///! A bloom filter can tell you with certainty that a key is **not** in the set
///! (no false negatives), but may occasionally report that a key **is** in the
///! set when it isn't (false positives). The false positive rate depends on the
///! number of bits and hash functions used.
///!
///! ## Usage
///!
///! Each SSTable embeds a bloom filter built from its keys. During point lookups
///! the engine checks the bloom filter first -- if it says "not present", the
///! SSTable is skipped entirely, avoiding an index lookup and disk I/O.
///!
///! ## On-disk format
///!
///! The hash function and bit layout below are part of the persisted SSTable
///! format. Changing either is a breaking format change.
///!
///! ## Example
///!
///! ```rust
///! use bloom::BloomFilter;
///!
///! let mut bf = BloomFilter::new(1000, 0.01);
///! bf.insert(b"hello");
///! assert!(bf.may_contain(b"hello"));
///! ```
use std::io::{self, Read, Write};

/// A bloom filter backed by a bit vector with `k` independent hash functions.
///
/// Each hash function is the same 32-bit mixing function seeded with a
/// different integer `0..k`, so the `k` bit positions for a given key are
/// reproducible across processes -- required since the bitset is persisted
/// to disk as part of an SSTable.
pub struct BloomFilter {
    /// The bit vector storing the filter state.
    bits: Vec<u8>,
    /// Number of bits in the filter (`m`).
    num_bits: u32,
    /// Number of hash functions (`k`).
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates a new bloom filter sized for `expected_items` with the given
    /// target `false_positive_rate`.
    ///
    /// `m = ceil(-n * ln(p) / ln(2)^2)`, `k = max(1, round(m/n * ln(2)))`.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0 or `false_positive_rate` is not in
    /// `(0, 1)`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        let n = expected_items as f64;
        let m = (-n * false_positive_rate.ln() / std::f64::consts::LN_2.powi(2)).ceil();
        let m = (m as u64).max(8).min(u32::MAX as u64) as u32;

        let k = ((m as f64 / n) * std::f64::consts::LN_2).round() as u32;
        let k = k.max(1);

        let byte_len = ((m as usize) + 7) / 8;

        Self {
            bits: vec![0u8; byte_len],
            num_bits: m,
            num_hashes: k,
        }
    }

    fn from_raw(bits: Vec<u8>, num_bits: u32, num_hashes: u32) -> Self {
        Self {
            bits,
            num_bits,
            num_hashes,
        }
    }

    /// Inserts a key into the bloom filter.
    pub fn insert(&mut self, key: &[u8]) {
        for seed in 0..self.num_hashes {
            let idx = self.bit_index(key, seed);
            self.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** be in the set, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        for seed in 0..self.num_hashes {
            let idx = self.bit_index(key, seed);
            if !self.get_bit(idx) {
                return false;
            }
        }
        true
    }

    #[must_use]
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Returns the size of the serialized bloom filter in bytes.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        4 + 4 + self.bits.len()
    }

    /// Serializes the bloom filter to a writer.
    ///
    /// Wire format (all big-endian):
    /// ```text
    /// [bit_count: i32][num_hashes: i32][bits: ceil(bit_count/8) bytes]
    /// ```
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&(self.num_bits as i32).to_be_bytes())?;
        w.write_all(&(self.num_hashes as i32).to_be_bytes())?;
        w.write_all(&self.bits)?;
        Ok(())
    }

    /// Deserializes a bloom filter from a reader. The reader must be
    /// positioned at the start of the blob.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf4)?;
        let num_bits = i32::from_be_bytes(buf4);
        if num_bits <= 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "bloom filter bit_count must be positive",
            ));
        }
        let num_bits = num_bits as u32;

        r.read_exact(&mut buf4)?;
        let num_hashes = i32::from_be_bytes(buf4);
        if num_hashes <= 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "bloom filter num_hash_functions must be positive",
            ));
        }
        let num_hashes = num_hashes as u32;

        let byte_len = ((num_bits as usize) + 7) / 8;
        const MAX_BLOOM_BYTES: usize = 128 * 1024 * 1024;
        if byte_len > MAX_BLOOM_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bloom filter too large: {} bytes", byte_len),
            ));
        }

        let mut bits = vec![0u8; byte_len];
        r.read_exact(&mut bits)?;

        Ok(Self::from_raw(bits, num_bits, num_hashes))
    }

    // ---- Internal helpers ----

    fn bit_index(&self, key: &[u8], seed: u32) -> u32 {
        let h = hash(key, seed as i32);
        h.unsigned_abs() % self.num_bits
    }

    fn set_bit(&mut self, idx: u32) {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        self.bits[byte_idx] |= 1 << bit_offset;
    }

    fn get_bit(&self, idx: u32) -> bool {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        (self.bits[byte_idx] >> bit_offset) & 1 == 1
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("bytes", &self.bits.len())
            .finish()
    }
}

/// Reproducible 32-bit hash: a rolling hash in the style of Java's
/// `String.hashCode` (`h = 31*h + c`, wrapping 32-bit signed arithmetic)
/// seeded with `seed`, followed by a murmur3-style finalizer mix. Part of
/// the on-disk bloom filter format -- must not change.
fn hash(data: &[u8], seed: i32) -> i32 {
    let mut h = seed;
    for &c in data {
        h = h.wrapping_mul(31).wrapping_add(c as i32);
    }

    let mut h = h as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EBCA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2AE35);
    h ^= h >> 16;
    h as i32
}
