use config::Config;
use std::path::Path;
use tempfile::tempdir;

use crate::Store;

fn open_with(config: Config) -> Store {
    Store::open(config).unwrap()
}

fn count_sst_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().map(|x| x == "db").unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}

fn wait_until(mut predicate: impl FnMut() -> bool, timeout_ms: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed().as_millis() < timeout_ms as u128 {
        if predicate() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    predicate()
}

#[test]
fn compaction_does_not_run_below_threshold() {
    let dir = tempdir().unwrap();
    let sstable_dir = dir.path().join("sstables");
    let store = open_with(
        Config::builder()
            .data_directory(dir.path())
            .memtable_max_size(32)
            .compaction_threshold(10)
            .build(),
    );

    for i in 0..6u32 {
        store
            .put(format!("k{i}").into_bytes(), b"0123456789".to_vec())
            .unwrap();
    }
    wait_until(|| count_sst_files(&sstable_dir) >= 2, 1000);
    std::thread::sleep(std::time::Duration::from_millis(200));

    assert!(
        count_sst_files(&sstable_dir) >= 2,
        "below threshold, sstables should accumulate uncompacted"
    );
}

#[test]
fn compaction_reduces_sstable_count_once_threshold_reached() {
    let dir = tempdir().unwrap();
    let sstable_dir = dir.path().join("sstables");
    let store = open_with(
        Config::builder()
            .data_directory(dir.path())
            .memtable_max_size(32)
            .compaction_threshold(2)
            .build(),
    );

    for i in 0..40u32 {
        store
            .put(format!("k{i}").into_bytes(), b"0123456789".to_vec())
            .unwrap();
    }

    let compacted = wait_until(|| count_sst_files(&sstable_dir) == 1, 3000);
    assert!(compacted, "expected compaction to merge down to a single sstable");
}

#[test]
fn compaction_preserves_newest_value_and_drops_dead_tombstones() {
    let dir = tempdir().unwrap();
    let store = open_with(
        Config::builder()
            .data_directory(dir.path())
            .memtable_max_size(24)
            .compaction_threshold(2)
            .build(),
    );

    store.put(b"alive".to_vec(), b"v1".to_vec()).unwrap();
    store.put(b"alive".to_vec(), b"v2".to_vec()).unwrap();
    store.put(b"dead".to_vec(), b"soon".to_vec()).unwrap();
    store.delete(b"dead".to_vec()).unwrap();

    for i in 0..20u32 {
        store
            .put(format!("pad{i}").into_bytes(), b"0123456789".to_vec())
            .unwrap();
    }

    wait_until(|| store.get(b"pad19").unwrap().is_some(), 3000);

    assert_eq!(store.get(b"alive").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(store.get(b"dead").unwrap(), None);
}

#[test]
fn compaction_threshold_zero_disables_compaction() {
    let dir = tempdir().unwrap();
    let sstable_dir = dir.path().join("sstables");
    let store = open_with(
        Config::builder()
            .data_directory(dir.path())
            .memtable_max_size(32)
            .compaction_threshold(0)
            .build(),
    );

    for i in 0..30u32 {
        store
            .put(format!("k{i}").into_bytes(), b"0123456789".to_vec())
            .unwrap();
    }
    std::thread::sleep(std::time::Duration::from_millis(500));

    assert!(
        count_sst_files(&sstable_dir) > 1,
        "compaction_threshold=0 should never trigger compaction"
    );
}

#[test]
fn reopen_after_compaction_resolves_correctly() {
    let dir = tempdir().unwrap();
    let sstable_dir = dir.path().join("sstables");
    let config = Config::builder()
        .data_directory(dir.path())
        .memtable_max_size(32)
        .compaction_threshold(2)
        .build();

    {
        let store = Store::open(config.clone()).unwrap();
        for i in 0..30u32 {
            store
                .put(format!("k{i}").into_bytes(), b"val".to_vec())
                .unwrap();
        }
        wait_until(|| count_sst_files(&sstable_dir) <= 2, 3000);
        store.close().unwrap();
    }

    let store = Store::open(config).unwrap();
    for i in 0..30u32 {
        assert_eq!(
            store.get(format!("k{i}").as_bytes()).unwrap(),
            Some(b"val".to_vec())
        );
    }
}
