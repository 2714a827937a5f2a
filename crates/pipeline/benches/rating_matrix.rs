//! Benchmarks for rating matrix construction
//!
//! Run with: cargo bench --package pipeline
//!
//! Uses 200k synthetic reviews over 1000 businesses and 20000 users, half of
//! the businesses selected.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::ReviewRecord;
use pipeline::{RatingMatrixBuilder, ThresholdPolicy};
use std::collections::HashSet;

fn synthetic_reviews() -> Vec<ReviewRecord> {
    (0..200_000usize)
        .map(|i| ReviewRecord {
            user_id: format!("u{:05}", (i * 7919) % 20_000),
            business_id: format!("b{:04}", (i * 104_729) % 1000),
            stars: (i % 5 + 1) as f32,
            date: format!("{}-{:02}-{:02} 12:00:00", 2016 + i % 4, i % 12 + 1, i % 28 + 1),
        })
        .collect()
}

fn selected() -> HashSet<String> {
    (0..1000).step_by(2).map(|b| format!("b{:04}", b)).collect()
}

fn bench_build(c: &mut Criterion) {
    let reviews = synthetic_reviews();
    let businesses = selected();
    let start = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();

    let mut group = c.benchmark_group("rating_matrix_build");
    for (name, policy) in [
        ("one_shot", ThresholdPolicy::OneShot),
        ("fixed_point", ThresholdPolicy::FixedPoint),
    ] {
        let builder = RatingMatrixBuilder::new(5).with_policy(policy);
        group.bench_function(name, |b| {
            b.iter(|| {
                let records = reviews.iter().cloned().map(Ok);
                let matrix = builder
                    .build(records, black_box(&businesses), black_box(start))
                    .unwrap();
                black_box(matrix)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
