use anyhow::{bail, Result};
use bloom::BloomFilter;
use entry::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::format::{read_header, read_index, read_record, HEADER_BYTES};

/// An immutable, on-disk sorted table.
///
/// [`SsTable::load`] loads the bloom filter and sparse index into memory;
/// the data region itself stays on disk and is read on demand through a
/// persistent file handle guarded by a `Mutex` (so [`get`](SsTable::get) only
/// needs `&self`).
pub struct SsTable {
    path: PathBuf,
    bloom: BloomFilter,
    index: BTreeMap<Vec<u8>, i64>,
    data_end: i64,
    file: Mutex<BufReader<File>>,
}

impl SsTable {
    /// Opens an SSTable file, loading its header, bloom filter, and sparse
    /// index into memory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut f = File::open(&path)?;
        let filesize = f.metadata()?.len();

        if filesize < HEADER_BYTES {
            bail!("sstable file too small for header: {}", path.display());
        }

        let (bloom_size, index_size) = read_header(&mut f)?;
        if bloom_size < 0 || index_size < 0 {
            bail!("sstable header has negative region size");
        }

        let data_end = filesize as i64 - bloom_size - index_size;
        if data_end < HEADER_BYTES as i64 {
            bail!("sstable header region sizes exceed file size");
        }

        f.seek(SeekFrom::Start(data_end as u64))?;
        let bloom = BloomFilter::read_from(&mut f)?;

        f.seek(SeekFrom::Start((data_end + bloom_size) as u64))?;
        let index_entries = read_index(&mut f)?;
        let index: BTreeMap<Vec<u8>, i64> = index_entries.into_iter().collect();

        f.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path,
            bloom,
            index,
            data_end,
            file: Mutex::new(BufReader::new(f)),
        })
    }

    /// Point lookup for `key`.
    ///
    /// Returns `Ok(None)` without touching disk if the bloom filter rules
    /// the key out. Otherwise seeks to the floor index entry (or the start
    /// of the data region if there is none) and scans forward; returns as
    /// soon as a matching key is found, or `Ok(None)` once the scanned key
    /// exceeds `key` or the scan reaches the end of the data region.
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        if !self.bloom.may_contain(key) {
            return Ok(None);
        }

        let start = self
            .index
            .range(..=key.to_vec())
            .next_back()
            .map(|(_, offset)| *offset)
            .unwrap_or(HEADER_BYTES as i64);

        let mut file = self
            .file
            .lock()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        file.seek(SeekFrom::Start(start as u64))?;

        loop {
            if file.stream_position()? as i64 >= self.data_end {
                return Ok(None);
            }
            let record = read_record(&mut *file)?;
            match record.key().cmp(key) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => return Ok(Some(record)),
                std::cmp::Ordering::Greater => return Ok(None),
            }
        }
    }

    /// Reads every entry in the data region, in ascending key order.
    ///
    /// Used by compaction to materialize the full contents of a set of
    /// SSTables before merging.
    pub fn all_entries(&self) -> Result<Vec<Entry>> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        file.seek(SeekFrom::Start(HEADER_BYTES))?;

        let mut entries = Vec::new();
        while (file.stream_position()? as i64) < self.data_end {
            entries.push(read_record(&mut *file)?);
        }
        Ok(entries)
    }

    /// Consumes the handle and deletes the underlying file.
    ///
    /// Idempotent: a file that is already gone (e.g. a second delete, or one
    /// racing the compactor's own cleanup) is not an error.
    pub fn delete(self) -> std::io::Result<()> {
        let path = self.path.clone();
        drop(self);
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of entries in the sparse index (not the total
    /// entry count -- use [`all_entries`](SsTable::all_entries) for that).
    #[must_use]
    pub fn sparse_index_len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
#[path = "tests/reader_tests.rs"]
mod reader_tests;
