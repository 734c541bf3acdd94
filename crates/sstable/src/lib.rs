//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the storage engine.
//!
//! When the in-memory [`memtable::Memtable`] exceeds its size threshold the
//! engine flushes it to disk as an SSTable. SSTables are *write-once,
//! read-many* -- once created they are never modified, only replaced
//! wholesale during compaction.
//!
//! ## File layout
//!
//! ```text
//! [ header 16 bytes: bloom_size(i64) | index_size(i64) ]
//! [ data region: key_len(i32) | key | value_len(i32) | value | timestamp(i64) | tombstone(i8), repeated ]
//! [ bloom region: serialized BloomFilter, bloom_size bytes ]
//! [ index region: entry_count(i32) | (key_len(i32) | key | offset(i64)), repeated ]
//! ```
//!
//! All multi-byte integers are big-endian. See [`format`] for the codec.

mod format;
mod reader;
mod writer;

pub use format::{HEADER_BYTES, MAX_KEY_BYTES, MAX_VALUE_BYTES};
pub use reader::SsTable;
