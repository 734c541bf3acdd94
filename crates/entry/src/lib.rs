//! # Entry
//!
//! The single immutable record type shared by the [`wal`](../wal/index.html),
//! [`memtable`](../memtable/index.html), and [`sstable`](../sstable/index.html)
//! crates.
//!
//! An `Entry` is either a live key/value pair or a tombstone recording that a
//! key was deleted. Entries are totally ordered by `(key ascending, timestamp
//! descending)`, which is exactly the order the read path needs: for a given
//! key, the newest entry sorts first.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of low bits of [`Entry::timestamp`] reserved for the per-process
/// tie-breaking counter. Wall-clock milliseconds collide easily under load;
/// folding a monotonic counter into the low bits keeps `(key, timestamp)`
/// strictly ordered within one process lifetime without changing the
/// on-disk encoding (still a single `i64`).
const SEQUENCE_BITS: u32 = 20;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Builds a timestamp: the current wall-clock millisecond count in the high
/// bits, a wrapping per-process counter in the low [`SEQUENCE_BITS`] bits.
fn next_timestamp() -> i64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64;
    let seq = SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed) & SEQUENCE_MASK;
    ((millis << SEQUENCE_BITS) | seq) as i64
}

/// An immutable record: a key, an optional value, a timestamp, and a
/// tombstone flag.
///
/// If `tombstone` is `true`, `value` is always `None`. Entries are never
/// mutated after construction — overwriting a key means inserting a new
/// `Entry`, not mutating an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
    timestamp: i64,
    tombstone: bool,
}

impl Entry {
    /// Creates a live entry for `key` holding `value`, stamped with the
    /// current time.
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value: Some(value),
            timestamp: next_timestamp(),
            tombstone: false,
        }
    }

    /// Creates a tombstone entry for `key`, stamped with the current time.
    pub fn tombstone(key: Vec<u8>) -> Self {
        Self {
            key,
            value: None,
            timestamp: next_timestamp(),
            tombstone: true,
        }
    }

    /// Reconstructs an entry with an explicit timestamp. Used by the `wal`
    /// and `sstable` crates when deserializing a record whose timestamp was
    /// already assigned at write time.
    pub fn from_parts(key: Vec<u8>, value: Option<Vec<u8>>, timestamp: i64, tombstone: bool) -> Self {
        Self {
            key,
            value,
            timestamp,
            tombstone,
        }
    }

    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Consumes the entry, returning its owned key/value parts.
    pub fn into_parts(self) -> (Vec<u8>, Option<Vec<u8>>, i64, bool) {
        (self.key, self.value, self.timestamp, self.tombstone)
    }

    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.tombstone
    }

    /// Approximate size in bytes: key length + value length + a fixed
    /// 9-byte metadata overhead (timestamp + tombstone flag).
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        self.key.len() + self.value.as_ref().map_or(0, |v| v.len()) + 9
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.timestamp.cmp(&self.timestamp))
    }
}
