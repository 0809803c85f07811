//! Benchmarks for the decycler trend filter

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use synthbot::trend::{decycle, Decycler};

fn benchmark_decycle_batch(c: &mut Criterion) {
    let prices: Vec<Decimal> = (0..500u32)
        .map(|i| Decimal::from(1000 + (i * 7) % 13))
        .collect();

    c.bench_function("decycle_batch_500", |b| {
        b.iter(|| decycle(black_box(&prices), dec!(0.07)))
    });
}

fn benchmark_decycler_incremental(c: &mut Criterion) {
    c.bench_function("decycler_incremental_update", |b| {
        let mut filter = Decycler::new(dec!(0.07));
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            filter.update(black_box(Decimal::from(1000 + (i % 13))))
        })
    });
}

criterion_group!(
    benches,
    benchmark_decycle_batch,
    benchmark_decycler_incremental
);
criterion_main!(benches);
