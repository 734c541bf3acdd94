//! # Engine — the `Store`
//!
//! Ties together [`memtable`], [`wal`], and [`sstable`] into a complete
//! LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! put/delete
//!   |
//!   v
//! write.rs -> WAL append -> active memtable insert
//!   |
//!   |  (active.size_bytes() >= memtable_max_size?)
//!   v
//! rotate_memtable -> active becomes immutable -> background flush
//!   |
//!   v
//! compaction.rs -> maybe_compact(sstable list snapshot)
//!
//! get
//!   |
//!   v
//! read.rs -> active memtable -> immutable memtable -> sstables (newest first)
//! ```
//!
//! ## Module responsibilities
//!
//! | Module        | Purpose                                                |
//! |---------------|---------------------------------------------------------|
//! | [`lib.rs`]    | `Store` struct, `open`, `close`, `stats`, accessors     |
//! | [`recovery`]  | WAL replay, SSTable directory loading, tmp-file cleanup |
//! | [`write`]     | `put()`, `delete()`, `rotate_memtable`, `flush`         |
//! | [`read`]      | `get()`                                                 |
//! | [`compaction`]| size-tiered merge with tombstone GC                     |
//! | [`executor`]  | shared background worker thread                         |
//! | [`error`]     | `StoreError`                                            |
//!
//! ## Crash safety
//!
//! Every write is appended to the WAL **before** the memtable update. The
//! WAL is cleared at the *start* of rotation (a documented, accepted
//! durability window -- see `DESIGN.md`). SSTables are always written
//! atomically via temp file + rename.

mod compaction;
mod error;
mod executor;
mod read;
mod recovery;
mod write;

pub use error::{Result, StoreError};

use config::Config;
use executor::Executor;
use memtable::Memtable;
use sstable::SsTable;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, RwLock};

/// The active/immutable memtable pair guarded by [`Store`]'s `RwLock`.
struct MemtablePair {
    active: Memtable,
    /// Set by `rotate_memtable` while a flush is in flight. Cleared once
    /// the background flush job reports success for *this exact* memtable
    /// (checked by `Arc` pointer identity), so a flush that finishes after
    /// a second rotation doesn't clobber a newer immutable memtable.
    immutable: Option<Arc<Memtable>>,
}

/// State shared between `Store` and jobs running on the background
/// executor. Wrapped in `Arc` so a flush/compaction closure can hold a
/// handle to it independent of the `Store` value's own lifetime.
struct StoreInner {
    memtables: RwLock<MemtablePair>,
    sstables: Mutex<Vec<SsTable>>,
    wal: wal::Wal,
    config: Config,
    sstable_dir: PathBuf,
    /// Per-process monotonic counter folded into SSTable filenames so
    /// lexicographic filename order equals creation order even under
    /// wall-clock collisions.
    file_seq: AtomicU64,
    /// Lives here (not on `Store` directly) so a background job holding an
    /// `Arc<StoreInner>` clone can itself submit a follow-on job (a flush
    /// scheduling a compaction) without needing a handle back to `Store`.
    executor: Executor,
}

/// The embeddable LSM-tree key-value store.
///
/// See the crate-level docs for the architecture; see `Store::open` for the
/// recovery sequence.
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let memtables = self.inner.memtables.read().unwrap_or_else(|e| e.into_inner());
        let sstables = self.inner.sstables.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("Store")
            .field("data_directory", &self.inner.config.data_directory())
            .field("active_entries", &memtables.active.entry_count())
            .field("has_immutable", &memtables.immutable.is_some())
            .field("sstable_count", &sstables.len())
            .finish()
    }
}

impl Store {
    /// Opens (or creates) a store rooted at `config.data_directory()`.
    ///
    /// 1. Creates the data directory and its `sstables/` subdirectory.
    /// 2. Removes any leftover `*.db.tmp` files from an interrupted flush.
    /// 3. Opens the WAL and replays its entries into a fresh active
    ///    memtable.
    /// 4. Loads every `*.db` file in the SSTable directory, sorted by
    ///    filename (hence by creation time).
    /// 5. Starts the background executor.
    pub fn open(config: Config) -> Result<Self> {
        let data_dir = config.data_directory().to_path_buf();
        let sstable_dir = config.sstable_directory();
        std::fs::create_dir_all(&sstable_dir)?;

        recovery::cleanup_tmp_files(&sstable_dir);

        let wal = wal::Wal::open(config.wal_path())?;
        let recovered = wal.recover()?;
        tracing::info!(recovered = recovered.len(), "replayed WAL entries");
        let active = recovery::replay_into_memtable(recovered);

        let sstables = recovery::load_sstables(&sstable_dir)?;
        tracing::info!(count = sstables.len(), dir = %sstable_dir.display(), "loaded sstables");

        let inner = Arc::new(StoreInner {
            memtables: RwLock::new(MemtablePair {
                active,
                immutable: None,
            }),
            sstables: Mutex::new(sstables),
            wal,
            config,
            sstable_dir,
            file_seq: AtomicU64::new(0),
            executor: Executor::start(),
        });

        Ok(Self { inner })
    }

    /// Flushes any in-memory data synchronously, closes the WAL, and shuts
    /// down the background executor (bounded 10-second drain, then
    /// abandoned).
    pub fn close(self) -> Result<()> {
        {
            let mut memtables = self
                .inner
                .memtables
                .write()
                .map_err(|_| StoreError::CorruptData("memtable lock poisoned".into()))?;

            if let Some(immutable) = memtables.immutable.take() {
                write::flush_memtable(&self.inner, &immutable)?;
            }
            if !memtables.active.is_empty() {
                let active = std::mem::replace(&mut memtables.active, Memtable::new());
                write::flush_memtable(&self.inner, &active)?;
            }
        }

        self.inner.wal.flush_and_sync()?;
        self.inner.executor.shutdown();
        Ok(())
    }

    /// A human-readable multi-line summary: active memtable entry count and
    /// byte size, immutable memtable summary if present, and SSTable count.
    #[must_use]
    pub fn stats(&self) -> String {
        let memtables = self.inner.memtables.read().unwrap_or_else(|e| e.into_inner());
        let sstables = self.inner.sstables.lock().unwrap_or_else(|e| e.into_inner());

        let mut out = String::new();
        out.push_str(&format!(
            "active memtable: {} entries, {} bytes\n",
            memtables.active.entry_count(),
            memtables.active.size_bytes()
        ));
        match &memtables.immutable {
            Some(imm) => out.push_str(&format!(
                "immutable memtable: {} entries, {} bytes (flush in flight)\n",
                imm.entry_count(),
                imm.size_bytes()
            )),
            None => out.push_str("immutable memtable: none\n"),
        }
        out.push_str(&format!("sstables: {}\n", sstables.len()));
        out
    }
}
