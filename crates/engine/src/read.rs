//! Read path: `Store::get`.
//!
//! Checks the active memtable, then the immutable memtable (if a flush is
//! in flight), then every SSTable newest to oldest. The first hit wins;
//! tombstones translate to `None` at whichever layer they're found.

use entry::Entry;

use crate::error::{Result, StoreError};
use crate::Store;

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::CorruptData("lock poisoned".into())
}

fn translate(entry: &Entry) -> Option<Vec<u8>> {
    entry.value().map(|v| v.to_vec())
}

impl Store {
    /// Looks up `key`.
    ///
    /// Returns `Ok(None)` for a missing key or one shadowed by a tombstone
    /// -- never an error for "not found".
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("key must not be empty".into()));
        }

        {
            let memtables = self.inner.memtables.read().map_err(poisoned)?;
            if let Some(entry) = memtables.active.get(key) {
                return Ok(translate(entry));
            }
            if let Some(immutable) = &memtables.immutable {
                if let Some(entry) = immutable.get(key) {
                    return Ok(translate(entry));
                }
            }
        }

        let sstables = self.inner.sstables.lock().map_err(poisoned)?;
        for table in sstables.iter().rev() {
            if let Some(entry) = table.get(key)? {
                return Ok(translate(&entry));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
#[path = "tests/read_tests.rs"]
mod read_tests;
