use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use entry::Entry;
use tempfile::tempdir;
use wal::Wal;

const N_APPENDS: usize = 5_000;
const VALUE_SIZE: usize = 100;

fn wal_append_benchmark(c: &mut Criterion) {
    c.bench_function("wal_append_5k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.wal");
                let wal = Wal::open(&path).unwrap();
                (dir, wal)
            },
            |(_dir, wal)| {
                for i in 0..N_APPENDS {
                    let entry = Entry::new(format!("key{i}").into_bytes(), vec![b'x'; VALUE_SIZE]);
                    wal.append(&entry).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn wal_recover_benchmark(c: &mut Criterion) {
    c.bench_function("wal_recover_5k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.wal");
                let wal = Wal::open(&path).unwrap();
                for i in 0..N_APPENDS {
                    let entry = Entry::new(format!("key{i}").into_bytes(), vec![b'x'; VALUE_SIZE]);
                    wal.append(&entry).unwrap();
                }
                (dir, wal)
            },
            |(_dir, wal)| {
                let entries = wal.recover().unwrap();
                assert_eq!(entries.len(), N_APPENDS);
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, wal_append_benchmark, wal_recover_benchmark);
criterion_main!(benches);
