//! Pipeline integration: file loading, batch ordering, per-symbol isolation.

use std::io::Write;

use chrono::{DateTime, Duration, TimeZone, Utc};
use confluence_core::components::{
    create_scorer, Requirement, Scorer, ScoringContext, Setup, Trace, Veto,
};
use confluence_core::config::EngineConfig;
use confluence_core::domain::{
    BundleMeta, Candle, CandleBundle, CandleSeries, PivotSet, ScorerKind, Timeframe,
};
use confluence_runner::{load_batch, load_config, BatchInput, CycleReport, Pipeline, SymbolInput};

// ── Helpers ──────────────────────────────────────────────────────────

fn end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()
}

fn series(n: usize, price: f64, step: Duration) -> CandleSeries {
    let closes: Vec<f64> = (0..n)
        .map(|i| price + price * 0.0003 * (i as f64 * 0.9).sin())
        .collect();
    let wick = price * 0.0005;
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + wick;
            let low = open.min(close) - wick;
            Candle {
                time: end() - step * (n - 1 - i) as i32,
                open,
                high,
                low,
                close,
                volume: Some(1000.0),
                typical: Some((high + low + close) / 3.0),
            }
        })
        .collect();
    CandleSeries::from_chronological(candles)
}

fn input(symbol: &str, price: f64) -> SymbolInput {
    let bundle = CandleBundle {
        symbol: symbol.into(),
        data_5m: series(60, price, Duration::minutes(5)),
        data_15m: series(120, price, Duration::minutes(15)),
        data_1h: series(120, price, Duration::hours(1)),
        data_4h: series(120, price, Duration::hours(4)),
        data_daily: series(220, price, Duration::days(1)),
        hist_atr_4h: (1..=100).map(|i| i as f64 * price * 0.0001).collect(),
        meta: BundleMeta {
            symbol: symbol.into(),
            pip_size: None,
        },
    };
    SymbolInput::new(bundle, PivotSet::default())
}

/// Panics when scoring the symbol `BOOM`, vetoes everything else.
struct ExplodingScorer;

impl Scorer for ExplodingScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Momentum
    }

    fn name(&self) -> &str {
        "exploding"
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![Requirement::new(Timeframe::M15, 2)]
    }

    fn score(&self, ctx: &ScoringContext<'_>, _trace: &mut Trace) -> Result<Setup, Veto> {
        if ctx.bundle.symbol == "BOOM" {
            panic!("exploding scorer");
        }
        Err(Veto::NoEntry("never trades".into()))
    }
}

// ── Batch behavior ───────────────────────────────────────────────────

#[test]
fn panicking_symbol_is_isolated_and_order_is_kept() {
    let config = EngineConfig::default();
    let scorers: Vec<Box<dyn Scorer>> = vec![
        create_scorer(ScorerKind::Momentum, &config),
        Box::new(ExplodingScorer),
    ];
    let pipeline = Pipeline::with_scorers(config, scorers).unwrap();
    let batch = BatchInput::new(vec![
        input("EURUSD", 1.1),
        input("BOOM", 2.0),
        input("USDJPY", 150.0),
    ]);

    let report = pipeline.evaluate_batch(&batch, true);
    let symbols: Vec<&str> = report.signals.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["EURUSD", "BOOM", "USDJPY"]);

    let boom = &report.signals[1];
    assert!(boom.is_flat());
    assert_eq!(boom.reason, "aggregation error: panicked: exploding scorer");
    assert_eq!(boom.meta.scorer, "confluence");

    for healthy in [&report.signals[0], &report.signals[2]] {
        assert!(healthy.is_well_formed());
        assert!(!healthy.reason.starts_with("aggregation error"), "{}", healthy.reason);
    }

    let audit = report.scorer_signals.as_ref().unwrap();
    assert_eq!(audit.len(), 3);
    assert_eq!(audit[0].signals.len(), 2);
    assert!(audit[1].signals.is_empty());
    assert!(audit[0].signals[1].reason.contains("never trades"));
}

#[test]
fn report_is_stamped_and_repeatable() {
    let pipeline = Pipeline::new(EngineConfig::default()).unwrap();
    let batch = BatchInput::new(vec![input("EURUSD", 1.1), input("GBPJPY", 190.0)]);

    let first = pipeline.evaluate_batch(&batch, false);
    let second = pipeline.evaluate_batch(&batch, false);
    assert_eq!(first, second);
    assert_eq!(first.config_hash, EngineConfig::default().fingerprint());
    assert_eq!(first.cycle_time, Some(end()));
    assert!(first.scorer_signals.is_none());
    assert_eq!(first.summary().buy + first.summary().sell + first.summary().flat, 2);
    assert_eq!(first.signal_for("GBPJPY").unwrap().meta.pip_size, 0.01);
}

// ── Files ────────────────────────────────────────────────────────────

#[test]
fn batch_and_config_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let batch = BatchInput::new(vec![input("EURUSD", 1.1)]);
    let batch_path = dir.path().join("batch.json");
    std::fs::write(&batch_path, serde_json::to_string(&batch).unwrap()).unwrap();
    let loaded = load_batch(&batch_path).unwrap();
    assert_eq!(loaded, batch);

    let config = EngineConfig {
        min_confidence: 0.65,
        ..Default::default()
    };
    let config_path = dir.path().join("engine.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(config.to_toml_string().unwrap().as_bytes()).unwrap();
    let reloaded = load_config(&config_path).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.fingerprint(), config.fingerprint());

    let report = Pipeline::new(reloaded).unwrap().evaluate_batch(&loaded, false);
    let json = report.to_json(true).unwrap();
    let back: CycleReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}
