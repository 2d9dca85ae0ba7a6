//! Benchmarks for the in-memory star schema transform.
//!
//! Snapshots are generated once per size with a fixed seed, so every
//! iteration transforms identical input.

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shop_etl::etl::{extract, transform};
use shop_etl::generate::Populator;
use shop_etl::source::DuckDbSource;
use shop_data_gen::Volumes;
use std::hint::black_box;

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    group.sample_size(20);

    for orders in [1_000usize, 10_000] {
        let mut store = DuckDbSource::open_in_memory().unwrap();
        Populator::new(
            &mut store,
            Volumes {
                users: orders / 5,
                products: 200,
                orders,
                order_items: orders * 3,
            },
            42,
        )
        .anchor(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
        .run()
        .unwrap();
        let snapshot = extract(&mut store).unwrap();

        group.throughput(Throughput::Elements(snapshot.order_items.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("line_items", snapshot.order_items.len()),
            &snapshot,
            |b, snapshot| b.iter(|| black_box(transform(black_box(snapshot)).fact_orders.len())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_transform);
criterion_main!(benches);
