//! # WAL — Write-Ahead Log
//!
//! Provides crash-safe durability for the storage engine.
//!
//! Every mutation (`PUT` or `DELETE`) is serialized into a text record and
//! appended to the WAL **before** the corresponding in-memory update. On
//! restart the WAL is replayed to reconstruct the memtable, guaranteeing that
//! no acknowledged write is lost.
//!
//! ## Line Format
//!
//! One record per line:
//!
//! ```text
//! <escaped_key>|<escaped_value>|<timestamp>|<tombstone>
//! ```
//!
//! `escape` replaces `\` with `\\` and `|` with `\|`. Field splitting honors
//! escaping: a record is split only on pipes that are not immediately
//! preceded by an odd run of backslashes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use entry::Entry;
//! use wal::Wal;
//!
//! let w = Wal::open("wal.log").unwrap();
//! w.append(&Entry::new(b"hello".to_vec(), b"world".to_vec())).unwrap();
//! let recovered = w.recover().unwrap();
//! ```

use entry::Entry;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// An append-only, crash-safe log of entries.
///
/// Every [`append`](Wal::append) is flushed to disk before returning.
/// Concurrent callers are serialized by an internal mutex around the file
/// handle, independent of whatever locking the caller layers on top.
pub struct Wal {
    path: PathBuf,
    file: Mutex<File>,
}

impl Wal {
    /// Opens (or creates) a WAL file in read+append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Serializes `entry` to one text line and appends it, flushing to disk
    /// before returning.
    pub fn append(&self, entry: &Entry) -> Result<(), WalError> {
        let line = serialize(entry);
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(&line)?;
        file.write_all(b"\n")?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Reads the file line by line, returning entries in on-disk order.
    ///
    /// Lines are read as raw bytes, not UTF-8 text -- keys and values may
    /// contain arbitrary bytes, and a line that happened to split one in
    /// the middle of a multi-byte UTF-8 sequence must not abort recovery.
    /// A malformed line is logged and skipped rather than aborting recovery.
    pub fn recover(&self) -> Result<Vec<Entry>, WalError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut buf = Vec::new();
        let mut lineno = 0usize;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            lineno += 1;

            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.is_empty() {
                continue;
            }

            match deserialize(&buf) {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!(line = lineno, "skipping malformed WAL record");
                }
            }
        }

        Ok(entries)
    }

    /// Truncates the WAL to empty, atomically from the caller's perspective.
    pub fn clear(&self) -> Result<(), WalError> {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .read(true)
            .open(&self.path)?;
        *guard = fresh;
        Ok(())
    }

    /// Flushes and syncs the file handle without consuming the WAL. Useful
    /// for callers that hold the `Wal` behind a shared handle and cannot
    /// give up ownership just to close it out.
    pub fn flush_and_sync(&self) -> Result<(), WalError> {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        guard.flush()?;
        guard.sync_all()?;
        Ok(())
    }

    /// Flushes and drops the file handle.
    pub fn close(self) -> Result<(), WalError> {
        self.flush_and_sync()
    }
}

fn open_append(path: &Path) -> Result<File, WalError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)
        .map_err(WalError::Io)
}

/// Replaces `\` with `\\` and `|` with `\|`.
///
/// Operates on raw bytes rather than `char`/`String` — a key or value may be
/// arbitrary binary data or non-UTF-8 text, and routing a byte like `0xE9`
/// through `char` would re-encode it as a two-byte UTF-8 sequence instead of
/// preserving it as the single byte it is.
fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'|' => out.extend_from_slice(b"\\|"),
            _ => out.push(b),
        }
    }
    out
}

/// Inverse of [`escape`]. Bytes outside the escaped set pass through
/// unchanged.
fn unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\\' && i + 1 < data.len() {
            out.push(data[i + 1]);
            i += 2;
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

fn serialize(entry: &Entry) -> Vec<u8> {
    let key = escape(entry.key());
    let value = escape(entry.value().unwrap_or(&[]));
    let mut line = Vec::with_capacity(key.len() + value.len() + 24);
    line.extend_from_slice(&key);
    line.push(b'|');
    line.extend_from_slice(&value);
    line.push(b'|');
    line.extend_from_slice(entry.timestamp().to_string().as_bytes());
    line.push(b'|');
    line.extend_from_slice(entry.is_tombstone().to_string().as_bytes());
    line
}

/// Splits `line` on pipes that are not escaped (not preceded by an odd run
/// of backslashes immediately before them).
fn split_unescaped(line: &[u8]) -> Vec<&[u8]> {
    let mut fields = Vec::new();
    let mut field_start = 0;
    let mut backslash_run = 0usize;

    for (i, &b) in line.iter().enumerate() {
        if b == b'\\' {
            backslash_run += 1;
            continue;
        }
        if b == b'|' && backslash_run % 2 == 0 {
            fields.push(&line[field_start..i]);
            field_start = i + 1;
        }
        backslash_run = 0;
    }
    fields.push(&line[field_start..]);
    fields
}

fn deserialize(line: &[u8]) -> Option<Entry> {
    let fields = split_unescaped(line);
    if fields.len() != 4 {
        return None;
    }

    let key = unescape(fields[0]);
    let raw_value = unescape(fields[1]);
    let timestamp: i64 = std::str::from_utf8(fields[2]).ok()?.parse().ok()?;
    let tombstone: bool = std::str::from_utf8(fields[3]).ok()?.parse().ok()?;

    let value = if tombstone { None } else { Some(raw_value) };

    Some(Entry::from_parts(key, value, timestamp, tombstone))
}
