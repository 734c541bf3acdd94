//! SSTable binary format: header, record, and index codecs.
//!
//! ## Layout (all multi-byte integers big-endian)
//!
//! ```text
//! [ header 16 bytes ]
//!   bloom_size   : i64
//!   index_size   : i64
//! [ data region  ]   -- entries in ascending key order, each:
//!   key_len      : i32
//!   key_bytes    : key_len bytes
//!   value_len    : i32
//!   value_bytes  : value_len bytes  (may be 0)
//!   timestamp    : i64
//!   tombstone    : i8 (0/1)
//! [ bloom region ]   -- exactly bloom_size bytes (serialized bloom filter)
//! [ index region ]   -- sparse index:
//!   entry_count  : i32
//!   repeated entry_count times:
//!      key_len   : i32
//!      key_bytes : key_len bytes
//!      offset    : i64  (absolute byte offset of the record in the file)
//! ```

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use entry::Entry;
use std::io::{self, Read, Write};

/// Size of the fixed header in bytes: `bloom_size` (i64) + `index_size` (i64).
pub const HEADER_BYTES: u64 = 16;

/// Maximum key size we'll allocate while reading (64 KiB). Guards against
/// corrupt files driving an unbounded allocation.
pub const MAX_KEY_BYTES: usize = 64 * 1024;

/// Maximum value size we'll allocate while reading (16 MiB).
pub const MAX_VALUE_BYTES: usize = 16 * 1024 * 1024;

/// Writes the 16-byte header: `bloom_size` then `index_size`, both big-endian i64.
pub fn write_header<W: Write>(w: &mut W, bloom_size: i64, index_size: i64) -> io::Result<()> {
    w.write_i64::<BigEndian>(bloom_size)?;
    w.write_i64::<BigEndian>(index_size)?;
    Ok(())
}

/// Reads the 16-byte header, returning `(bloom_size, index_size)`.
pub fn read_header<R: Read>(r: &mut R) -> io::Result<(i64, i64)> {
    let bloom_size = r.read_i64::<BigEndian>()?;
    let index_size = r.read_i64::<BigEndian>()?;
    Ok((bloom_size, index_size))
}

/// Writes a single data-region record for `entry`.
pub fn write_record<W: Write>(w: &mut W, entry: &Entry) -> io::Result<()> {
    let key = entry.key();
    let value = entry.value().unwrap_or(&[]);

    w.write_i32::<BigEndian>(key.len() as i32)?;
    w.write_all(key)?;
    w.write_i32::<BigEndian>(value.len() as i32)?;
    w.write_all(value)?;
    w.write_i64::<BigEndian>(entry.timestamp())?;
    w.write_i8(entry.is_tombstone() as i8)?;
    Ok(())
}

/// Reads one data-region record.
///
/// A non-tombstone record with zero-length value deserializes to
/// `Some(vec![])`, not `None` -- `None` is reserved for tombstones.
pub fn read_record<R: Read>(r: &mut R) -> io::Result<Entry> {
    let key_len = r.read_i32::<BigEndian>()? as usize;
    if key_len > MAX_KEY_BYTES {
        return Err(invalid_data(format!(
            "sstable record key_len {} exceeds maximum {}",
            key_len, MAX_KEY_BYTES
        )));
    }
    let mut key = vec![0u8; key_len];
    r.read_exact(&mut key)?;

    let value_len = r.read_i32::<BigEndian>()? as usize;
    if value_len > MAX_VALUE_BYTES {
        return Err(invalid_data(format!(
            "sstable record value_len {} exceeds maximum {}",
            value_len, MAX_VALUE_BYTES
        )));
    }
    let mut value_bytes = vec![0u8; value_len];
    r.read_exact(&mut value_bytes)?;

    let timestamp = r.read_i64::<BigEndian>()?;
    let tombstone = r.read_i8()? != 0;

    let value = if tombstone { None } else { Some(value_bytes) };
    Ok(Entry::from_parts(key, value, timestamp, tombstone))
}

/// Writes the sparse index section: an `i32` entry count followed by
/// `(key_len, key, offset)` triples.
pub fn write_index<W: Write>(w: &mut W, index: &[(Vec<u8>, i64)]) -> io::Result<()> {
    w.write_i32::<BigEndian>(index.len() as i32)?;
    for (key, offset) in index {
        w.write_i32::<BigEndian>(key.len() as i32)?;
        w.write_all(key)?;
        w.write_i64::<BigEndian>(*offset)?;
    }
    Ok(())
}

/// Reads the sparse index section in full.
pub fn read_index<R: Read>(r: &mut R) -> io::Result<Vec<(Vec<u8>, i64)>> {
    let count = r.read_i32::<BigEndian>()?;
    if count < 0 {
        return Err(invalid_data("sstable index entry_count is negative"));
    }
    let count = count as usize;

    let mut index = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let key_len = r.read_i32::<BigEndian>()? as usize;
        if key_len > MAX_KEY_BYTES {
            return Err(invalid_data(format!(
                "sstable index key_len {} exceeds maximum {}",
                key_len, MAX_KEY_BYTES
            )));
        }
        let mut key = vec![0u8; key_len];
        r.read_exact(&mut key)?;
        let offset = r.read_i64::<BigEndian>()?;
        index.push((key, offset));
    }
    Ok(index)
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
