//! Size-tiered compaction: merge every current SSTable into one, resolving
//! duplicate keys by newest timestamp and dropping dead tombstones.

use entry::Entry;
use sstable::SsTable;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::StoreInner;

/// Called after every flush with the current SSTable count. Schedules a
/// compaction job on the background executor if the count has reached
/// `compaction_threshold`. A no-op if `compaction_threshold` is `0`.
pub(crate) fn maybe_compact(inner: &Arc<StoreInner>, sstable_count: usize) {
    let threshold = inner.config.compaction_threshold();
    if threshold == 0 || sstable_count < threshold {
        return;
    }

    let job_inner = Arc::clone(inner);
    inner.executor.submit_compact(move || {
        if let Err(e) = run_compaction(&job_inner) {
            tracing::error!(error = %e, "compaction failed; sstable list left untouched");
        }
    });
}

/// Merges every SSTable currently registered on `inner` into at most one
/// new SSTable, then deletes the sources.
///
/// 1. Take every source table out from under the list mutex (released
///    again immediately -- the merge itself reads each source's on-disk
///    data, not the lock).
/// 2. For each key, retain the entry with the largest timestamp across all
///    sources.
/// 3. Drop any key whose winning entry is a tombstone (garbage collection).
/// 4. If nothing survives, just delete the sources.
/// 5. Otherwise write a new SSTable (filename carries creation time + a
///    monotonic disambiguator so filename order still equals recency),
///    install it as the sole entry in the list, then delete the sources.
fn run_compaction(inner: &Arc<StoreInner>) -> anyhow::Result<()> {
    let sources = {
        let mut sstables = inner
            .sstables
            .lock()
            .map_err(|_| anyhow::anyhow!("sstable list lock poisoned"))?;
        std::mem::take(&mut *sstables)
    };

    if sources.len() < 2 {
        // Nothing to merge; put the (at most one) table back untouched.
        let mut sstables = inner
            .sstables
            .lock()
            .map_err(|_| anyhow::anyhow!("sstable list lock poisoned"))?;
        *sstables = sources;
        return Ok(());
    }

    let mut winners: BTreeMap<Vec<u8>, Entry> = BTreeMap::new();
    for table in &sources {
        for entry in table.all_entries()? {
            match winners.get(entry.key()) {
                Some(existing) if existing.timestamp() >= entry.timestamp() => {}
                _ => {
                    winners.insert(entry.key().to_vec(), entry);
                }
            }
        }
    }

    let survivors: Vec<Entry> = winners.into_values().filter(Entry::is_live).collect();

    let source_paths: Vec<_> = sources.iter().map(|t| t.path().to_path_buf()).collect();

    if survivors.is_empty() {
        tracing::info!(sources = sources.len(), "compaction produced no surviving entries");
        drop(sources);
        for path in source_paths {
            let _ = std::fs::remove_file(path);
        }
        return Ok(());
    }

    let filename = next_compacted_filename(inner);
    let path = inner.sstable_dir.join(&filename);
    let fpr = inner.config.bloom_filter_false_positive_rate_fraction();
    SsTable::create(&path, &survivors, fpr)?;
    let merged = SsTable::load(&path)?;

    tracing::info!(
        sources = sources.len(),
        survivors = survivors.len(),
        file = %filename,
        "compacted sstables"
    );

    drop(sources);
    for source_path in source_paths {
        let _ = std::fs::remove_file(source_path);
    }

    let mut sstables = inner
        .sstables
        .lock()
        .map_err(|_| anyhow::anyhow!("sstable list lock poisoned"))?;
    sstables.push(merged);

    Ok(())
}

fn next_compacted_filename(inner: &Arc<StoreInner>) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis();
    let seq = inner.file_seq.fetch_add(1, AtomicOrdering::Relaxed);
    format!("sstable_{millis:020}-{seq:020}.db")
}

#[cfg(test)]
#[path = "tests/compaction_tests.rs"]
mod compaction_tests;
