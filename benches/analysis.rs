//! Benchmarks for pattern detection, indicators and multi-symbol analysis.

use candlecast::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic pseudo-random walk
fn generate_candles(n: usize) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0;
        let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

        let o = price;
        let c = (price + change).max(1.0);
        let h = o.max(c) + volatility * 0.5;
        let l = (o.min(c) - volatility * 0.5).max(0.5);

        candles.push(Candle::new(i as i64, o, h, l, c, 1_000 + (i % 17) as u64 * 100));
        price = c;
    }

    candles
}

fn bench_detect_window(c: &mut Criterion) {
    let candles = generate_candles(250);
    let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

    c.bench_function("detect_all_rules_250_candles", |b| {
        b.iter(|| black_box(engine.detect(black_box(&candles))))
    });
}

fn bench_rolling_history(c: &mut Criterion) {
    let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
    let mut group = c.benchmark_group("rolling_history");

    for size in [100, 500, 1000].iter() {
        let candles = generate_candles(*size);
        group.bench_with_input(BenchmarkId::new("iter", size), size, |b, _| {
            b.iter(|| black_box(engine.iter(black_box(&candles)).map(|it| it.count())))
        });
    }

    group.finish();
}

fn bench_indicators(c: &mut Criterion) {
    let closes: Vec<f64> = generate_candles(500).iter().map(|c| c.close).collect();

    c.bench_function("indicator_set_500_closes", |b| {
        b.iter(|| black_box(IndicatorSet::compute(black_box(&closes))))
    });

    let indicators = IndicatorSet::compute(&closes).unwrap();
    let trend = classify(&closes);
    c.bench_function("predict_500_closes", |b| {
        b.iter(|| black_box(predict(black_box(&closes), &indicators, trend)))
    });
}

fn bench_analyze_parallel(c: &mut Criterion) {
    let analyzer = Analyzer::new().unwrap();
    let series: Vec<(String, Vec<Candle>)> = (0..16)
        .map(|i| (format!("SYM{i}"), generate_candles(300 + i * 10)))
        .collect();
    let instruments: Vec<(&str, &[Candle])> = series
        .iter()
        .map(|(s, c)| (s.as_str(), c.as_slice()))
        .collect();

    c.bench_function("analyze_parallel_16_symbols", |b| {
        b.iter(|| {
            // fresh cache so every iteration computes predictions
            let cache = PredictionCache::new();
            black_box(analyze_parallel(
                black_box(&analyzer),
                instruments.clone(),
                &cache,
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_detect_window,
    bench_rolling_history,
    bench_indicators,
    bench_analyze_parallel,
);
criterion_main!(benches);
