use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use entry::Entry;
use sstable::SsTable;
use tempfile::tempdir;

const N_KEYS: usize = 10_000;
const VALUE_SIZE: usize = 100;
const FPR: f64 = 0.01;

fn build_entries() -> Vec<Entry> {
    (0..N_KEYS)
        .map(|i| Entry::new(format!("key{i:06}").into_bytes(), vec![b'x'; VALUE_SIZE]))
        .collect()
}

fn sstable_write_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_create_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.db");
                let entries = build_entries();
                (dir, path, entries)
            },
            |(_dir, path, entries)| {
                SsTable::create(&path, &entries, FPR).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn sstable_get_hit_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_get_hit_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.db");
                let entries = build_entries();
                SsTable::create(&path, &entries, FPR).unwrap();
                let table = SsTable::load(&path).unwrap();
                (dir, table)
            },
            |(_dir, table)| {
                for i in 0..N_KEYS {
                    let key = format!("key{i:06}").into_bytes();
                    assert!(table.get(&key).unwrap().is_some());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn sstable_get_miss_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_get_miss_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.db");
                let entries = build_entries();
                SsTable::create(&path, &entries, FPR).unwrap();
                let table = SsTable::load(&path).unwrap();
                (dir, table)
            },
            |(_dir, table)| {
                for i in 0..N_KEYS {
                    let key = format!("missing{i:06}").into_bytes();
                    assert!(table.get(&key).unwrap().is_none());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    sstable_write_benchmark,
    sstable_get_hit_benchmark,
    sstable_get_miss_benchmark
);
criterion_main!(benches);
