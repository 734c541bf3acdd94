//! Error type returned by every public [`crate::Store`] operation.
//!
//! Lower crates (`bloom`, `wal`, `memtable`, `sstable`) keep their own
//! narrow error types appropriate to their own failure modes. `Store` is
//! the layer that normalizes everything into one typed error so callers
//! never have to match on a stack of unrelated error enums.

use std::io;
use thiserror::Error;

/// Errors surfaced by [`crate::Store`].
///
/// "Not found" is never one of these — a missing key is represented as
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An absent key on any operation, or an absent value on `put`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Propagated from the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// SSTable header inconsistent with file size, an index pointing past
    /// the data region, or a bloom filter that failed to deserialize.
    #[error("corrupt data: {0}")]
    CorruptData(String),
}

impl From<wal::WalError> for StoreError {
    fn from(err: wal::WalError) -> Self {
        match err {
            wal::WalError::Io(e) => StoreError::Io(e),
        }
    }
}

/// `sstable` and the bloom filter it embeds report failures as
/// `anyhow::Error`. Most of those are genuinely "this file on disk doesn't
/// look like a valid SSTable" and become `CorruptData`, but a read or write
/// can also fail with a plain `io::Error` wrapped along the way (a permission
/// error, a disk full) -- that case is unwrapped back to `Io` rather than
/// misreported as corruption.
impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<io::Error>() {
            Ok(io_err) => StoreError::Io(io_err),
            Err(err) => StoreError::CorruptData(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
