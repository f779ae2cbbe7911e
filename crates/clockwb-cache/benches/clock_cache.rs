#![forbid(unsafe_code)]

use clockwb_cache::{ClockCache, MemoryStore};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn seeded_store(keys: u64) -> MemoryStore<u64, u64> {
    let store = MemoryStore::new();
    for key in 0..keys {
        store.insert(key, key ^ 0x5A5A);
    }
    store
}

// ── Benchmarks ──────────────────────────────────────────────────────────

fn bench_hit(c: &mut Criterion) {
    let store = seeded_store(64);
    let mut cache = ClockCache::<u64, u64, _>::new(64, &store).expect("cache");
    for key in 0..64 {
        cache.get(&key).expect("warmup");
    }

    c.bench_function("clock_cache_hit", |b| {
        let mut key = 0_u64;
        b.iter(|| {
            key = (key + 1) % 64;
            black_box(cache.get(black_box(&key)).expect("hit"));
        });
    });
}

fn bench_clean_miss(c: &mut Criterion) {
    let store = seeded_store(4096);
    let mut cache = ClockCache::<u64, u64, _>::new(256, &store).expect("cache");

    c.bench_function("clock_cache_clean_miss", |b| {
        let mut key = 0_u64;
        b.iter(|| {
            key = (key + 1) % 4096;
            black_box(cache.get(black_box(&key)).expect("miss"));
        });
    });
}

fn bench_dirty_writeback(c: &mut Criterion) {
    let store = MemoryStore::<u64, u64>::new();
    let mut cache = ClockCache::<u64, u64, _>::new(256, &store).expect("cache");

    c.bench_function("clock_cache_dirty_writeback", |b| {
        let mut key = 0_u64;
        b.iter(|| {
            key = key.wrapping_add(1);
            black_box(cache.set(black_box(key), key).expect("set"));
        });
    });
}

fn bench_flush(c: &mut Criterion) {
    const ENTRIES: u64 = 64;
    const VALUE_SIZE: usize = 4096;

    c.bench_function("clock_cache_flush_64x4k", |b| {
        b.iter_batched(
            || {
                let mut cache =
                    ClockCache::new(64, MemoryStore::<u64, Vec<u8>>::new()).expect("cache");
                for key in 0..ENTRIES {
                    cache.set(key, vec![0xEE; VALUE_SIZE]).expect("set");
                }
                cache
            },
            |mut cache| cache.flush().expect("flush"),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_hit,
    bench_clean_miss,
    bench_dirty_writeback,
    bench_flush
);
criterion_main!(benches);
