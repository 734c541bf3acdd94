use anyhow::{bail, Result};
use bloom::BloomFilter;
use entry::Entry;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::format::{write_header, write_index, write_record};
use crate::reader::SsTable;

impl SsTable {
    /// Flushes `entries` (must be in ascending key order) to a new SSTable
    /// file at `path`, sized for a bloom filter with the given false-positive
    /// rate.
    ///
    /// All I/O happens against a sibling temp file (`<filename>.tmp`); on
    /// success the temp file is atomically renamed into place, and the
    /// parent directory is fsynced so the rename itself is durable. On any
    /// error the temp file is removed and nothing is left at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `entries` is empty or on any I/O failure.
    pub fn create<P: AsRef<Path>>(
        path: P,
        entries: &[Entry],
        false_positive_rate: f64,
    ) -> Result<()> {
        let path = path.as_ref();
        if entries.is_empty() {
            bail!("refusing to write an empty SSTable");
        }

        let tmp_path = tmp_path_for(path);
        let result = write_tmp(&tmp_path, entries, false_positive_rate);

        match result {
            Ok(()) => {
                rename(&tmp_path, path)?;
                if let Some(parent) = path.parent() {
                    if let Ok(dir) = std::fs::File::open(parent) {
                        let _ = dir.sync_all();
                    }
                }
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }
}

fn write_tmp(tmp_path: &Path, entries: &[Entry], false_positive_rate: f64) -> Result<()> {
    let raw_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;
    let mut file = BufWriter::new(raw_file);

    // Header placeholder, backpatched once the true region sizes are known.
    write_header(&mut file, 0, 0)?;

    let n = entries.len();
    let mut bloom = BloomFilter::new(n, false_positive_rate);
    let mut index: Vec<(Vec<u8>, i64)> = Vec::new();
    let stride = sparse_stride(n);

    for (i, entry) in entries.iter().enumerate() {
        let offset = file.stream_position()? as i64;
        write_record(&mut file, entry)?;
        bloom.insert(entry.key());
        if i % stride == 0 {
            index.push((entry.key().to_vec(), offset));
        }
    }

    let bloom_start = file.stream_position()?;
    bloom.write_to(&mut file)?;
    let bloom_size = file.stream_position()? - bloom_start;

    let index_start = file.stream_position()?;
    write_index(&mut file, &index)?;
    let index_size = file.stream_position()? - index_start;

    file.seek(SeekFrom::Start(0))?;
    write_header(&mut file, bloom_size as i64, index_size as i64)?;

    file.flush()?;
    file.into_inner()?.sync_all()?;

    Ok(())
}

/// Every `ceil(n/100)`-th entry is indexed, which degenerates to "every
/// entry" once `n < 100`.
fn sparse_stride(n: usize) -> usize {
    ((n + 99) / 100).max(1)
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "tests/writer_tests.rs"]
mod writer_tests;
