//! Strategy scorers — one per trading archetype.
//!
//! Every scorer implements the same `(CandleBundle, PivotSet) -> Signal`
//! contract through `evaluate_scorer`, which runs the shared gate chain:
//!
//! 1. data sufficiency per required timeframe
//! 2. volatility-spike veto on the newest 15m candle
//! 3. the archetype's own `score` (bias, entry, confidence, S/R context,
//!    confidence floor, stop, target)
//!
//! A failing gate is a `Veto`, never an error: it becomes a flat Signal whose
//! reason is the decision trace followed by the veto message. Scorers never
//! reference each other or hold state between calls.

pub mod breakout_retest;
pub mod context;
pub mod levels;
pub mod liquidity;
pub mod market_structure;
pub mod mean_reversion;
pub mod momentum;
pub mod vwap_bias;

pub use breakout_retest::BreakoutRetestScorer;
pub use context::{regime_snapshot, ScoringContext};
pub use liquidity::LiquidityScorer;
pub use market_structure::MarketStructureScorer;
pub use mean_reversion::MeanReversionScorer;
pub use momentum::MomentumScorer;
pub use vwap_bias::VwapBiasScorer;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::{
    clamp_confidence, CandleBundle, PivotSet, ScorerKind, Side, Signal, SignalMeta, SignalType, Timeframe,
};

/// Minimum candle count a scorer needs on one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub timeframe: Timeframe,
    pub min_candles: usize,
}

impl Requirement {
    pub fn new(timeframe: Timeframe, min_candles: usize) -> Self {
        Self {
            timeframe,
            min_candles,
        }
    }
}

/// Why a scorer declined to trade. Normal market outcomes, not faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Veto {
    #[error("insufficient data: {timeframe} has {have} candles, need {need}")]
    InsufficientData {
        timeframe: Timeframe,
        have: usize,
        need: usize,
    },
    #[error("indicator unavailable: {0}")]
    IndicatorUnavailable(&'static str),
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("volatility spike: 15m range {range:.5} > {multiple}x ATR {atr:.5}")]
    VolatilitySpike { range: f64, atr: f64, multiple: f64 },
    #[error("no bias: {0}")]
    NoBias(String),
    #[error("no entry: {0}")]
    NoEntry(String),
    #[error("outside session windows (UTC hour {0})")]
    OutsideSession(u32),
    #[error("confidence {confidence:.2} below floor {floor:.2}")]
    ConfidenceFloor { confidence: f64, floor: f64 },
    #[error("no take-profit target: {0}")]
    NoTarget(String),
}

/// A stop or target, expressed either as a pip distance or an absolute price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    Pips(f64),
    Price(f64),
}

impl Offset {
    /// Resolve to (pips, price) relative to `entry`.
    ///
    /// `toward_profit` is true for targets, false for stops.
    pub fn resolve(self, entry: f64, side: Side, pip_size: f64, toward_profit: bool) -> (f64, f64) {
        let sign = if toward_profit { side.sign() } else { -side.sign() };
        match self {
            Offset::Pips(pips) => (pips, entry + sign * pips * pip_size),
            Offset::Price(price) => ((price - entry).abs() / pip_size, price),
        }
    }
}

/// A directional setup that passed every gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    pub side: Side,
    pub signal_type: SignalType,
    pub confidence: f64,
    pub price: f64,
    pub stop: Offset,
    pub target: Offset,
}

/// Decision path and indicator snapshot accumulated while scoring.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    steps: Vec<String>,
    indicators: BTreeMap<String, f64>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step to the human-readable decision path.
    pub fn note(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }

    /// Record a named indicator value. Non-finite values are skipped.
    pub fn record(&mut self, name: &str, value: f64) {
        if value.is_finite() {
            self.indicators.insert(name.to_string(), value);
        }
    }

    pub fn indicators(&self) -> &BTreeMap<String, f64> {
        &self.indicators
    }

    /// The full reason string: every step, then the terminal decision.
    pub fn reason(&self, terminal: &str) -> String {
        let mut parts: Vec<&str> = self.steps.iter().map(String::as_str).collect();
        parts.push(terminal);
        parts.join("; ")
    }

    pub fn into_indicators(self) -> BTreeMap<String, f64> {
        self.indicators
    }
}

/// Trait for strategy scorers.
///
/// `score` runs after the shared sufficiency and volatility gates have passed,
/// so it may rely on every `requirements()` entry being met.
pub trait Scorer: Send + Sync {
    fn kind(&self) -> ScorerKind;

    /// Human-readable name, used as `meta.scorer`.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Minimum candle counts per timeframe.
    fn requirements(&self) -> Vec<Requirement>;

    /// Bias, entry, confidence and risk derivation for one bundle.
    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto>;
}

/// Candle counts every scorer needs for the shared gates: ATR on 15m and 1h.
pub fn base_requirements(config: &EngineConfig) -> Vec<Requirement> {
    vec![
        Requirement::new(Timeframe::M15, config.atr_period + 1),
        Requirement::new(Timeframe::H1, config.atr_period + 1),
    ]
}

/// First requirement the bundle fails, as a veto.
pub fn check_requirements(bundle: &CandleBundle, requirements: &[Requirement]) -> Result<(), Veto> {
    for req in requirements {
        let have = bundle.series(req.timeframe).len();
        if have < req.min_candles {
            return Err(Veto::InsufficientData {
                timeframe: req.timeframe,
                have,
                need: req.min_candles,
            });
        }
    }
    Ok(())
}

/// Veto when the newest 15m candle's range exceeds the configured multiple of ATR(15m).
pub fn check_volatility(ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<(), Veto> {
    let range = ctx
        .bundle
        .data_15m
        .latest()
        .map(|c| c.range())
        .ok_or(Veto::MissingField("15m candle"))?;
    trace.record("range_15m", range);
    let multiple = ctx.config.volatility_spike_multiple;
    if range > multiple * ctx.atr_15m {
        return Err(Veto::VolatilitySpike {
            range,
            atr: ctx.atr_15m,
            multiple,
        });
    }
    Ok(())
}

/// Run one scorer's full gate chain. Always returns a well-formed Signal.
pub fn evaluate_scorer(
    scorer: &dyn Scorer,
    bundle: &CandleBundle,
    pivots: &PivotSet,
    config: &EngineConfig,
) -> Signal {
    let pip_size = bundle.pip_size();
    let meta = SignalMeta {
        symbol: bundle.symbol.clone(),
        pip_size,
        candle_time: bundle.data_15m.latest().map(|c| c.time),
        scorer: scorer.name().to_string(),
    };
    let regime = regime_snapshot(bundle, config);
    let mut trace = Trace::new();

    let outcome = run_gates(scorer, bundle, pivots, config, &mut trace);

    let mut signal = match outcome {
        Ok(setup) => {
            let terminal = format!(
                "{} {} accepted at {:.2}",
                setup.signal_type,
                setup.side,
                clamp_confidence(setup.confidence)
            );
            let reason = trace.reason(&terminal);
            let (sl_pips, sl_price) = setup.stop.resolve(setup.price, setup.side, pip_size, false);
            let (tp_pips, tp_price) = setup.target.resolve(setup.price, setup.side, pip_size, true);
            let mut signal = Signal::directional(
                bundle.symbol.clone(),
                setup.side,
                setup.confidence,
                setup.signal_type,
                setup.price,
                reason,
                meta,
            );
            signal.recommended_sl_pips = Some(sl_pips);
            signal.recommended_sl_price = Some(sl_price);
            signal.recommended_tp_pips = Some(tp_pips);
            signal.recommended_tp_price = Some(tp_price);
            signal
        }
        Err(veto) => {
            let reason = trace.reason(&format!("flat: {veto}"));
            Signal::flat(
                bundle.symbol.clone(),
                scorer.kind().default_signal_type(),
                reason,
                meta,
            )
        }
    };

    signal.indicators = trace.into_indicators();
    signal.regime = regime;
    signal.sr_data = Some(*pivots);

    debug!(
        symbol = %signal.symbol,
        scorer = scorer.name(),
        direction = %signal.direction,
        confidence = signal.confidence,
        "scorer outcome"
    );
    signal
}

fn run_gates(
    scorer: &dyn Scorer,
    bundle: &CandleBundle,
    pivots: &PivotSet,
    config: &EngineConfig,
    trace: &mut Trace,
) -> Result<Setup, Veto> {
    check_requirements(bundle, &base_requirements(config))?;
    check_requirements(bundle, &scorer.requirements())?;
    let ctx = ScoringContext::new(bundle, pivots, config)?;
    trace.record("atr_1h", ctx.atr_1h);
    trace.record("atr_15m", ctx.atr_15m);
    check_volatility(&ctx, trace)?;
    scorer.score(&ctx, trace)
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Bundle builders shared by the scorer tests.

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::domain::{BundleMeta, Candle, CandleBundle, CandleSeries};

    /// A timestamp at the given UTC hour on 2024-03-04 (a Monday).
    pub fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
    }

    /// Chronological candles from closes, ending at `end` with `step` spacing.
    ///
    /// Open = previous close; high/low pad the body by `wick`.
    pub fn series_from_closes(closes: &[f64], end: DateTime<Utc>, step: Duration, wick: f64) -> CandleSeries {
        let n = closes.len();
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                let high = open.max(close) + wick;
                let low = open.min(close) - wick;
                Candle {
                    time: end - step * (n - 1 - i) as i32,
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

    /// Closes oscillating around a linear drift.
    pub fn drift(n: usize, start: f64, slope: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| start + slope * i as f64 + amplitude * (i as f64 * 0.9).sin())
            .collect()
    }

    /// Closes built from straight legs of `(steps, slope)` starting at `start`.
    pub fn piecewise(start: f64, legs: &[(usize, f64)]) -> Vec<f64> {
        let mut closes = vec![start];
        for &(steps, slope) in legs {
            for _ in 0..steps {
                let last = closes[closes.len() - 1];
                closes.push(last + slope);
            }
        }
        closes
    }

    /// A bundle with every timeframe filled from the same gentle drift.
    pub fn flat_bundle(symbol: &str, price: f64, end: DateTime<Utc>) -> CandleBundle {
        let wick = price * 0.0005;
        let amp = price * 0.0003;
        CandleBundle {
            symbol: symbol.into(),
            data_5m: series_from_closes(&drift(60, price, 0.0, amp), end, Duration::minutes(5), wick),
            data_15m: series_from_closes(&drift(120, price, 0.0, amp), end, Duration::minutes(15), wick),
            data_1h: series_from_closes(&drift(120, price, 0.0, amp), end, Duration::hours(1), wick),
            data_4h: series_from_closes(&drift(120, price, 0.0, amp), end, Duration::hours(4), wick),
            data_daily: series_from_closes(&drift(220, price, 0.0, amp), end, Duration::days(1), wick),
            hist_atr_4h: vec![price * 0.001; 50],
            meta: BundleMeta {
                symbol: symbol.into(),
                pip_size: None,
            },
        }
    }
}
