//! # Config
//!
//! Tunables consumed by [`Store::open`](../engine/struct.Store.html#method.open).
//!
//! Built via [`ConfigBuilder`] (or `Config::default()` for the stock
//! settings); every field has a default matching the reference format, so
//! most callers only override what they actually care about.
//!
//! ## Example
//! ```rust
//! use config::Config;
//!
//! let config = Config::builder()
//!     .data_directory("/tmp/my_store")
//!     .memtable_max_size(4 * 1024 * 1024)
//!     .build();
//! ```

use std::path::{Path, PathBuf};

/// Root path default: `<root>/wal.log` holds the WAL, `<root>/sstables/`
/// holds every SSTable file.
const DEFAULT_DATA_DIRECTORY: &str = "lsm_data";
const DEFAULT_MEMTABLE_MAX_SIZE: usize = 1_048_576;
const DEFAULT_SSTABLE_MAX_SIZE: usize = 10_485_760;
/// Target false-positive rate as an integer percent (1 == 1%).
const DEFAULT_BLOOM_FILTER_FALSE_POSITIVE_RATE: u32 = 1;
const DEFAULT_COMPACTION_THRESHOLD: usize = 4;

/// Storage engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    data_directory: PathBuf,
    memtable_max_size: usize,
    sstable_max_size: usize,
    bloom_filter_false_positive_rate: u32,
    compaction_threshold: usize,
}

impl Config {
    /// Starts a [`ConfigBuilder`] seeded with the default settings.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    #[must_use]
    pub fn memtable_max_size(&self) -> usize {
        self.memtable_max_size
    }

    /// Currently informational only: no code path enforces it. Kept for
    /// parity with the reference format and exposed for forward
    /// compatibility.
    #[must_use]
    pub fn sstable_max_size(&self) -> usize {
        self.sstable_max_size
    }

    /// Target bloom filter false-positive rate, as an integer percent
    /// (e.g. `1` means 1%). Use [`Config::bloom_filter_false_positive_rate_fraction`]
    /// for the `0.0..1.0` value the `bloom` crate expects.
    #[must_use]
    pub fn bloom_filter_false_positive_rate(&self) -> u32 {
        self.bloom_filter_false_positive_rate
    }

    #[must_use]
    pub fn bloom_filter_false_positive_rate_fraction(&self) -> f64 {
        f64::from(self.bloom_filter_false_positive_rate) / 100.0
    }

    #[must_use]
    pub fn compaction_threshold(&self) -> usize {
        self.compaction_threshold
    }

    /// `<data_directory>/wal.log`.
    #[must_use]
    pub fn wal_path(&self) -> PathBuf {
        self.data_directory.join("wal.log")
    }

    /// `<data_directory>/sstables`.
    #[must_use]
    pub fn sstable_directory(&self) -> PathBuf {
        self.data_directory.join("sstables")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from(DEFAULT_DATA_DIRECTORY),
            memtable_max_size: DEFAULT_MEMTABLE_MAX_SIZE,
            sstable_max_size: DEFAULT_SSTABLE_MAX_SIZE,
            bloom_filter_false_positive_rate: DEFAULT_BLOOM_FILTER_FALSE_POSITIVE_RATE,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}

/// Fluent builder for [`Config`]. Each setter consumes and returns `self` so
/// calls chain; unset fields keep their default.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(Config::default())
    }

    #[must_use]
    pub fn data_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.0.data_directory = path.into();
        self
    }

    #[must_use]
    pub fn memtable_max_size(mut self, bytes: usize) -> Self {
        self.0.memtable_max_size = bytes;
        self
    }

    #[must_use]
    pub fn sstable_max_size(mut self, bytes: usize) -> Self {
        self.0.sstable_max_size = bytes;
        self
    }

    /// `rate` is an integer percent (e.g. `1` for 1%).
    #[must_use]
    pub fn bloom_filter_false_positive_rate(mut self, rate: u32) -> Self {
        self.0.bloom_filter_false_positive_rate = rate;
        self
    }

    #[must_use]
    pub fn compaction_threshold(mut self, threshold: usize) -> Self {
        self.0.compaction_threshold = threshold;
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.0
    }
}

#[cfg(test)]
mod tests;
