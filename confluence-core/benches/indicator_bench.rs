//! Criterion benchmarks for the signal core hot paths.
//!
//! Benchmarks:
//! 1. Indicator series compute (each indicator, then the full stack)
//! 2. Single scorer evaluation on a realistic bundle
//! 3. Full cycle: six scorers plus aggregation

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use confluence_core::components::indicator::Indicator;
use confluence_core::components::{create_scorer, default_scorers, evaluate_scorer, Aggregator};
use confluence_core::config::EngineConfig;
use confluence_core::domain::{
    BundleMeta, Candle, CandleBundle, CandleSeries, PivotLevels, PivotSet, ScorerKind, Signal,
};
use confluence_core::indicators::{Adx, Atr, Bollinger, Ema, Rsi, StochRsi, Vwap};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize, step: Duration) -> Vec<Candle> {
    let end = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 1.1 + (i as f64 * 0.1).sin() * 0.01;
            let open = close - 0.0003;
            let high = close + 0.0015;
            let low = close - 0.0015;
            Candle {
                time: end - step * (n - 1 - i) as i32,
                open,
                high,
                low,
                close,
                volume: Some(1000.0 + (i % 500) as f64),
                typical: Some((high + low + close) / 3.0),
            }
        })
        .collect()
}

fn make_bundle() -> CandleBundle {
    let series = |n, step| CandleSeries::from_chronological(make_candles(n, step));
    CandleBundle {
        symbol: "EURUSD".into(),
        data_5m: series(100, Duration::minutes(5)),
        data_15m: series(200, Duration::minutes(15)),
        data_1h: series(200, Duration::hours(1)),
        data_4h: series(200, Duration::hours(4)),
        data_daily: series(250, Duration::days(1)),
        hist_atr_4h: (1..=100).map(|i| i as f64 * 0.0001).collect(),
        meta: BundleMeta {
            symbol: "EURUSD".into(),
            pip_size: Some(0.0001),
        },
    }
}

fn make_pivots() -> PivotSet {
    PivotSet {
        pivots: PivotLevels {
            p: Some(1.1000),
            s1: Some(1.0960),
            s2: Some(1.0920),
            s3: Some(1.0880),
            r1: Some(1.1040),
            r2: Some(1.1080),
            r3: Some(1.1120),
        },
        pdh: Some(1.1060),
        pdl: Some(1.0940),
        pdc: Some(1.1000),
    }
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_compute");

    for &count in &[250, 1000, 5000] {
        let candles = make_candles(count, Duration::minutes(15));

        let rsi = Rsi::new(14);
        group.bench_with_input(BenchmarkId::new("rsi_14", count), &count, |b, _| {
            b.iter(|| rsi.compute(black_box(&candles)));
        });

        let full_stack: Vec<Box<dyn Indicator>> = vec![
            Box::new(Rsi::new(14)),
            Box::new(Atr::new(14)),
            Box::new(Ema::new(50)),
            Box::new(Ema::new(200)),
            Box::new(Bollinger::new(20, 2.0)),
            Box::new(Adx::new(14)),
            Box::new(StochRsi::new(14, 14, 3, 3)),
            Box::new(Vwap::new(32)),
        ];
        group.bench_with_input(BenchmarkId::new("full_stack_8", count), &count, |b, _| {
            b.iter(|| {
                full_stack
                    .iter()
                    .map(|ind| ind.compute(black_box(&candles)))
                    .collect::<Vec<_>>()
            });
        });
    }

    group.finish();
}

// ── 2. Scorers ───────────────────────────────────────────────────────

fn bench_scorers(c: &mut Criterion) {
    let mut group = c.benchmark_group("scorer_evaluate");
    let config = EngineConfig::default();
    let bundle = make_bundle();
    let pivots = make_pivots();

    for kind in ScorerKind::ALL {
        let scorer = create_scorer(kind, &config);
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| evaluate_scorer(scorer.as_ref(), black_box(&bundle), black_box(&pivots), &config));
        });
    }

    group.finish();
}

// ── 3. Full cycle ────────────────────────────────────────────────────

fn bench_cycle(c: &mut Criterion) {
    let config = EngineConfig::default();
    let scorers = default_scorers(&config);
    let aggregator = Aggregator::from_config(&config);
    let bundle = make_bundle();
    let pivots = make_pivots();

    c.bench_function("cycle_six_scorers", |b| {
        b.iter(|| {
            let signals: Vec<Signal> = scorers
                .iter()
                .map(|s| evaluate_scorer(s.as_ref(), black_box(&bundle), black_box(&pivots), &config))
                .collect();
            aggregator.aggregate("EURUSD", &signals, Some(&pivots))
        });
    });
}

criterion_group!(benches, bench_indicators, bench_scorers, bench_cycle);
criterion_main!(benches);
