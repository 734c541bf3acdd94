//! Cold-start recovery: WAL replay and SSTable directory loading.

use entry::Entry;
use memtable::Memtable;
use sstable::SsTable;
use std::path::Path;

use crate::error::Result;

/// Replays every entry recovered from the WAL into a fresh memtable.
///
/// A WAL line that fails to deserialize is already logged and skipped by
/// [`wal::Wal::recover`] itself; this function just applies whatever comes
/// back, in on-disk order (later lines for the same key naturally win
/// because they're inserted later).
pub fn replay_into_memtable(entries: Vec<Entry>) -> Memtable {
    let mut mem = Memtable::new();
    for entry in entries {
        mem.insert(entry);
    }
    mem
}

/// Loads every `*.db` file in `sstable_dir`, sorted by filename ascending
/// (oldest first, since filenames encode creation time).
///
/// A directory that does not exist yet is treated as empty rather than an
/// error -- a fresh `Store::open` creates it before this is ever called, so
/// in practice this only matters for callers that delete it out from under
/// the process between creation and recovery.
pub fn load_sstables(sstable_dir: &Path) -> Result<Vec<SsTable>> {
    if !sstable_dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = std::fs::read_dir(sstable_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "db").unwrap_or(false))
        .collect();
    paths.sort();

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        match SsTable::load(&path) {
            Ok(table) => tables.push(table),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load sstable, skipping");
            }
        }
    }
    Ok(tables)
}

/// Removes any leftover `*.db.tmp` files from an interrupted flush or
/// compaction.
pub fn cleanup_tmp_files(sstable_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(sstable_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(".db.tmp"))
            .unwrap_or(false)
        {
            let _ = std::fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
#[path = "tests/recovery_tests.rs"]
mod recovery_tests;
