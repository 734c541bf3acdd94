//! Write path: `Store::put`, `Store::delete`, memtable rotation, and the
//! memtable -> SSTable flush invoked both synchronously (on `close`) and
//! from the background executor (after a rotation).

use entry::Entry;
use memtable::Memtable;
use sstable::SsTable;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, StoreError};
use crate::{MemtablePair, Store, StoreInner};

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::CorruptData("lock poisoned".into())
}

impl Store {
    /// Inserts a key-value pair.
    ///
    /// Appends the entry to the WAL, then inserts it into the active
    /// memtable under the write lock. Rotates the memtable if that push
    /// crossed `memtable_max_size`.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("key must not be empty".into()));
        }
        if value.is_empty() {
            return Err(StoreError::InvalidArgument("value must not be empty".into()));
        }

        let entry = Entry::new(key, value);
        self.inner.wal.append(&entry)?;
        self.apply_and_maybe_rotate(entry)
    }

    /// Deletes a key by writing a tombstone entry.
    pub fn delete(&self, key: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("key must not be empty".into()));
        }

        let entry = Entry::tombstone(key);
        self.inner.wal.append(&entry)?;
        self.apply_and_maybe_rotate(entry)
    }

    fn apply_and_maybe_rotate(&self, entry: Entry) -> Result<()> {
        let mut memtables = self.inner.memtables.write().map_err(poisoned)?;
        memtables.active.insert(entry);

        if memtables.active.size_bytes() >= self.inner.config.memtable_max_size() {
            rotate_memtable(&self.inner, &mut memtables)?;
        }
        Ok(())
    }
}

/// Rotates the memtable pair under an already-held write lock.
///
/// 1. If an immutable memtable is already present, flush it synchronously
///    first (the background flusher is by definition behind; catching up
///    here keeps the invariant "at most one immutable memtable at a time").
/// 2. Move active -> immutable, install a fresh empty active memtable.
/// 3. Clear the WAL (at the *start* of rotation -- see `DESIGN.md` for the
///    accepted durability window this creates).
/// 4. Queue a background job to flush the new immutable memtable; on
///    success, clear the immutable slot iff it still points at the memtable
///    that was just flushed (a concurrent second rotation may have already
///    installed a newer one).
pub(crate) fn rotate_memtable(inner: &Arc<StoreInner>, memtables: &mut MemtablePair) -> Result<()> {
    if let Some(stale_immutable) = memtables.immutable.take() {
        flush_memtable(inner, &stale_immutable)?;
    }

    let old_active = std::mem::replace(&mut memtables.active, Memtable::new());
    let immutable = Arc::new(old_active);
    memtables.immutable = Some(Arc::clone(&immutable));

    inner.wal.clear()?;

    let job_inner = Arc::clone(inner);
    let job_immutable = Arc::clone(&immutable);
    inner.executor.submit_flush(move || match flush_memtable(&job_inner, &job_immutable) {
        Ok(()) => {
            if let Ok(mut memtables) = job_inner.memtables.write() {
                let still_current = memtables
                    .immutable
                    .as_ref()
                    .map(|imm| Arc::ptr_eq(imm, &job_immutable))
                    .unwrap_or(false);
                if still_current {
                    memtables.immutable = None;
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "background flush failed; immutable memtable retained for retry on next rotation");
        }
    });

    Ok(())
}

/// Writes `memtable`'s contents to a new SSTable, registers it, and checks
/// whether compaction should be scheduled. A no-op for an empty memtable.
pub(crate) fn flush_memtable(inner: &Arc<StoreInner>, memtable: &Memtable) -> Result<()> {
    if memtable.is_empty() {
        return Ok(());
    }

    let entries: Vec<Entry> = memtable.snapshot().into_values().collect();
    let filename = next_sstable_filename(inner);
    let path = inner.sstable_dir.join(&filename);
    let fpr = inner.config.bloom_filter_false_positive_rate_fraction();

    SsTable::create(&path, &entries, fpr)?;
    let table = SsTable::load(&path)?;
    tracing::info!(file = %filename, entries = entries.len(), "flushed memtable to sstable");

    let count = {
        let mut sstables = inner.sstables.lock().map_err(poisoned)?;
        sstables.push(table);
        sstables.len()
    };

    crate::compaction::maybe_compact(inner, count);
    Ok(())
}

fn next_sstable_filename(inner: &Arc<StoreInner>) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis();
    let seq = inner.file_seq.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    format!("sstable_{millis:020}-{seq:020}.db")
}

#[cfg(test)]
#[path = "tests/write_tests.rs"]
mod write_tests;
