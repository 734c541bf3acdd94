use config::Config;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine::Store;
use tempfile::tempdir;

const N_KEYS: usize = 2_000;
const VALUE_SIZE: usize = 100;

fn engine_put_benchmark(c: &mut Criterion) {
    c.bench_function("engine_put_2k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let config = Config::builder().data_directory(dir.path()).build();
                let store = Store::open(config).unwrap();
                (dir, store)
            },
            |(_dir, store)| {
                for i in 0..N_KEYS {
                    store
                        .put(format!("key{i}").into_bytes(), vec![b'x'; VALUE_SIZE])
                        .unwrap();
                }
                store.close().unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn engine_get_hit_benchmark(c: &mut Criterion) {
    c.bench_function("engine_get_hit_2k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let config = Config::builder().data_directory(dir.path()).build();
                let store = Store::open(config).unwrap();
                for i in 0..N_KEYS {
                    store
                        .put(format!("key{i}").into_bytes(), vec![b'x'; VALUE_SIZE])
                        .unwrap();
                }
                (dir, store)
            },
            |(_dir, store)| {
                for i in 0..N_KEYS {
                    let key = format!("key{i}").into_bytes();
                    assert!(store.get(&key).unwrap().is_some());
                }
                store.close().unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, engine_put_benchmark, engine_get_hit_benchmark);
criterion_main!(benches);
