//! Criterion benchmarks for [`DeviceRegistry`] insertion.
//!
//! Discovery events arrive on the registry's single writer, so `try_add`
//! latency bounds how quickly a burst of advertisements can be applied.
//!
//! Run with:
//! ```bash
//! cargo bench --package peerlink-core --bench registry_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use peerlink_core::{Address, BondState, DeviceRecord, DeviceRegistry};

// ── Fixture builders ──────────────────────────────────────────────────────────

/// Builds `n` records with distinct addresses, every fourth one bonded.
fn build_records(n: usize) -> Vec<DeviceRecord> {
    (0..n)
        .map(|i| {
            let bond = if i % 4 == 0 {
                BondState::Bonded
            } else {
                BondState::NotBonded
            };
            DeviceRecord::new(
                Address::new(format!("00:00:00:00:{:02X}:{:02X}", i / 256, i % 256)),
                Some(format!("peer-{i}")),
                bond,
            )
        })
        .collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// Fills an empty registry with `n` fresh records.
fn bench_fill_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("try_add_fresh");

    for n in [16usize, 64, 256] {
        let records = build_records(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| {
                let mut registry = DeviceRegistry::new();
                for r in records {
                    registry.try_add(black_box(r.clone()));
                }
                registry
            })
        });
    }

    group.finish();
}

/// Re-reports every address of an already full registry (the common case
/// during a long scan, where peers keep advertising).
fn bench_duplicate_reports(c: &mut Criterion) {
    let records = build_records(64);
    let mut registry = DeviceRegistry::new();
    for r in &records {
        registry.try_add(r.clone());
    }

    c.bench_function("try_add_duplicate_64", |b| {
        b.iter(|| {
            for r in &records {
                black_box(registry.try_add(r.clone()));
            }
        })
    });
}

/// Copies out the ordered snapshot handed to the presentation layer.
fn bench_snapshot(c: &mut Criterion) {
    let mut registry = DeviceRegistry::new();
    for r in build_records(64) {
        registry.try_add(r);
    }

    c.bench_function("snapshot_64", |b| b.iter(|| black_box(registry.snapshot())));
}

criterion_group!(
    benches,
    bench_fill_registry,
    bench_duplicate_reports,
    bench_snapshot
);
criterion_main!(benches);
