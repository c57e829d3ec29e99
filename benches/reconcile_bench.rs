//! Reconciliation Benchmarks — Plan Computation Throughput
//!
//! Benchmarks the reconciler and supplier price parsing on catalogs
//! sized like a real seller account.
//!
//! Run with: cargo bench --bench reconcile_bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use marketplace_stock_sync::domain::catalog::{CatalogItem, ReferenceItem};
use marketplace_stock_sync::domain::pricing::parse_supplier_price;
use marketplace_stock_sync::domain::reconcile::{ReconcileOptions, Reconciler};

/// Catalog of `n` offers and a supplier list overlapping 80% of it.
fn snapshots(n: usize) -> (Vec<CatalogItem>, Vec<ReferenceItem>) {
    let catalog = (0..n)
        .map(|i| CatalogItem::listed(format!("SKU-{i:06}")))
        .collect();
    let reference = (n / 5..n + n / 5)
        .map(|i| ReferenceItem {
            offer_id: format!("SKU-{i:06}"),
            price: Decimal::new(599_050 + i as i64, 2),
            stock: (i % 12) as i64,
        })
        .collect();
    (catalog, reference)
}

/// Benchmark a full reconciliation at several catalog sizes.
fn bench_reconcile(c: &mut Criterion) {
    let reconciler = Reconciler::new(ReconcileOptions {
        zero_missing_stock: true,
        ..ReconcileOptions::default()
    });

    let mut group = c.benchmark_group("reconcile");
    for n in [1_000usize, 10_000, 50_000] {
        let (catalog, reference) = snapshots(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| reconciler.reconcile(black_box(&catalog), black_box(&reference)));
        });
    }
    group.finish();
}

/// Benchmark supplier price parsing.
fn bench_parse_price(c: &mut Criterion) {
    c.bench_function("parse_supplier_price", |b| {
        b.iter(|| parse_supplier_price(black_box("10'500.50 руб.")));
    });
}

criterion_group!(benches, bench_reconcile, bench_parse_price);
criterion_main!(benches);
