use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nex_core::{NewEntry, Origin, Tier};
use nex_store::TieredStore;

fn new_entry(i: u64) -> NewEntry {
    NewEntry {
        name: format!("item-{i}"),
        value_per_second: "25.0M/s".to_string(),
        magnitude: 25_000_000.0,
        job_id: format!("job-{}", i % 17),
        obfuscate: true,
        origin: Origin::Manual,
        owner: "owner".to_string(),
        occupancy: "6/8".to_string(),
    }
}

fn bench_ingest(c: &mut Criterion) {
    let store = TieredStore::default();
    let mut i = 0u64;
    c.bench_function("ingest_full_tier", |b| {
        b.iter(|| {
            i += 1;
            black_box(store.ingest(new_entry(i)).unwrap());
        })
    });
}

fn bench_queries(c: &mut Criterion) {
    let store = TieredStore::default();
    for i in 0..100 {
        store.ingest(new_entry(i)).unwrap();
    }

    c.bench_function("recent_for_autojoin", |b| {
        b.iter(|| black_box(store.recent_for_autojoin(Tier::High, Duration::from_secs(600))))
    });
    c.bench_function("unique_servers", |b| {
        b.iter(|| black_box(store.unique_servers(Tier::High, 20)))
    });
    c.bench_function("sweep_nothing_expired", |b| {
        b.iter(|| black_box(store.sweep(Duration::from_secs(3600))))
    });
}

criterion_group!(benches, bench_ingest, bench_queries);
criterion_main!(benches);
