//! Confluence aggregator — reduces one symbol's scorer signals to one decision.
//!
//! Steps:
//! 1. validity gate: the first signal carrying a regime snapshot
//! 2. regime classification (trend from the daily EMA flag, volatility from
//!    the 4h ATR percentile)
//! 3. absolute veto on a neutral trend in high volatility
//! 4. selection table by regime and signal category
//! 5. average confidence of the selected signals; the highest-confidence one
//!    supplies price, stop, target and type
//! 6. SL/TP prices materialized from pips with the instrument's pip size
//!
//! `aggregate` is total: any internal fault becomes a flat signal for this
//! symbol only.

pub mod regime;

pub use regime::{Regime, Trend, Volatility};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AggregatorConfig, EngineConfig};
use crate::domain::{
    clamp_confidence, resolve_pip_size, PivotSet, RegimeSnapshot, Side, Signal, SignalMeta,
    SignalType,
};

/// Name stamped into `meta.scorer` of aggregated signals.
pub const CONFLUENCE: &str = "confluence";

/// Unexpected faults while aggregating one symbol.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("signal for {found} in the {expected} batch")]
    MixedSymbols { expected: String, found: String },
    #[error("selected signal from {scorer} has no price")]
    MissingPrice { scorer: String },
    #[error("selected signal from {scorer} has no stop distance")]
    MissingStop { scorer: String },
    #[error("non-finite {field} from {scorer}")]
    NonFinite { field: &'static str, scorer: String },
}

/// Signals approved by the selection table, with the reason it approved them.
#[derive(Debug)]
struct Selection<'a> {
    side: Side,
    signals: Vec<&'a Signal>,
    rule: &'static str,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.aggregator.clone())
    }

    /// One final signal for `symbol`. Never fails.
    pub fn aggregate(&self, symbol: &str, signals: &[Signal], pivots: Option<&PivotSet>) -> Signal {
        let signal = match self.try_aggregate(symbol, signals, pivots) {
            Ok(signal) => signal,
            Err(err) => {
                warn!(symbol, error = %err, "aggregation fault, emitting flat");
                let meta = base_meta(symbol, signals);
                let mut flat = Signal::flat(
                    symbol,
                    SignalType::Confluence,
                    format!("aggregation error: {err}"),
                    meta,
                );
                flat.sr_data = pivots.copied();
                flat
            }
        };
        info!(
            symbol,
            direction = %signal.direction,
            confidence = signal.confidence,
            signal_type = %signal.signal_type,
            "final decision"
        );
        signal
    }

    /// The aggregation steps, surfacing unexpected faults as errors.
    pub fn try_aggregate(
        &self,
        symbol: &str,
        signals: &[Signal],
        pivots: Option<&PivotSet>,
    ) -> Result<Signal, AggregationError> {
        if let Some(stray) = signals.iter().find(|s| s.symbol != symbol) {
            return Err(AggregationError::MixedSymbols {
                expected: symbol.to_string(),
                found: stray.symbol.clone(),
            });
        }

        let meta = base_meta(symbol, signals);
        let buys: Vec<&Signal> = signals.iter().filter(|s| s.side() == Some(Side::Buy)).collect();
        let sells: Vec<&Signal> = signals.iter().filter(|s| s.side() == Some(Side::Sell)).collect();

        let flat = |reason: String, snapshot: Option<RegimeSnapshot>| {
            let mut signal = Signal::flat(symbol, SignalType::Confluence, reason, meta.clone());
            signal.regime = snapshot;
            signal.sr_data = pivots.copied();
            signal.indicators.insert("agg.selected".into(), 0.0);
            signal.indicators.insert("agg.buy_count".into(), buys.len() as f64);
            signal.indicators.insert("agg.sell_count".into(), sells.len() as f64);
            signal
        };

        let Some(snapshot) = signals.iter().find_map(|s| s.regime) else {
            return Ok(flat("no valid indicator data".into(), None));
        };
        let regime = Regime::classify(&snapshot, self.config.high_volatility_percentile);
        if regime.is_volatile_chop() {
            return Ok(flat(format!("{regime}: volatile chop"), Some(snapshot)));
        }

        let Some(selection) = select(regime.trend, &buys, &sells) else {
            return Ok(flat(
                format!(
                    "{regime}: no signals match ({} buys, {} sells)",
                    buys.len(),
                    sells.len()
                ),
                Some(snapshot),
            ));
        };

        let total: f64 = selection.signals.iter().map(|s| s.confidence).sum();
        let average = total / selection.signals.len() as f64;
        // First of equals wins, so ties resolve in scorer order.
        let best = selection
            .signals
            .iter()
            .copied()
            .reduce(|best, s| if s.confidence > best.confidence { s } else { best })
            .ok_or_else(|| AggregationError::MissingPrice {
                scorer: CONFLUENCE.to_string(),
            })?;
        let scorer = best.meta.scorer.clone();
        if !average.is_finite() {
            return Err(AggregationError::NonFinite {
                field: "confidence",
                scorer,
            });
        }

        let price = best.price.ok_or_else(|| AggregationError::MissingPrice {
            scorer: scorer.clone(),
        })?;
        let sign = selection.side.sign();
        let pip = meta.pip_size;
        let sl_pips = best
            .recommended_sl_pips
            .or_else(|| best.recommended_sl_price.map(|p| (price - p).abs() / pip))
            .ok_or_else(|| AggregationError::MissingStop {
                scorer: scorer.clone(),
            })?;
        let tp_pips = best
            .recommended_tp_pips
            .or_else(|| best.recommended_tp_price.map(|p| (p - price).abs() / pip));
        if !price.is_finite() || !sl_pips.is_finite() {
            return Err(AggregationError::NonFinite {
                field: "price",
                scorer,
            });
        }

        let names: Vec<&str> = selection.signals.iter().map(|s| s.meta.scorer.as_str()).collect();
        let reason = format!(
            "{regime}: {} approved [{}]; average confidence {:.2}; best {scorer} at {:.2}",
            selection.rule,
            names.join(", "),
            clamp_confidence(average),
            best.confidence
        );

        let mut out = Signal::directional(
            symbol,
            selection.side,
            average,
            best.signal_type,
            price,
            reason,
            SignalMeta {
                candle_time: best.meta.candle_time,
                ..meta
            },
        );
        out.recommended_sl_pips = Some(sl_pips);
        out.recommended_sl_price = Some(price - sign * sl_pips * pip);
        out.recommended_tp_pips = tp_pips;
        out.recommended_tp_price = tp_pips.map(|tp| price + sign * tp * pip);
        out.indicators = best.indicators.clone();
        out.indicators.insert("agg.selected".into(), selection.signals.len() as f64);
        out.indicators.insert("agg.buy_count".into(), buys.len() as f64);
        out.indicators.insert("agg.sell_count".into(), sells.len() as f64);
        out.regime = Some(snapshot);
        out.sr_data = pivots.copied().or(best.sr_data);
        Ok(out)
    }
}

/// Provenance for the aggregated record.
fn base_meta(symbol: &str, signals: &[Signal]) -> SignalMeta {
    let explicit = signals
        .iter()
        .map(|s| s.meta.pip_size)
        .find(|p| p.is_finite() && *p > 0.0);
    SignalMeta {
        symbol: symbol.to_string(),
        pip_size: resolve_pip_size(explicit, symbol),
        candle_time: signals.iter().find_map(|s| s.meta.candle_time),
        scorer: CONFLUENCE.to_string(),
    }
}

fn with_side<'a>(pred: impl Fn(&Signal) -> bool, side: &[&'a Signal]) -> Vec<&'a Signal> {
    side.iter().copied().filter(|s| pred(s)).collect()
}

/// The selection table.
///
/// | Trend   | Approved                                                       |
/// |---------|----------------------------------------------------------------|
/// | Up      | all buys if any technical or dynamic buy; else reversion sells |
/// | Down    | all sells if any technical or dynamic sell; else reversion buys|
/// | Neutral | reversion/dynamic buys; else reversion/dynamic sells           |
fn select<'a>(trend: Trend, buys: &[&'a Signal], sells: &[&'a Signal]) -> Option<Selection<'a>> {
    let technical_or_dynamic = |s: &Signal| s.signal_type.is_technical() || s.signal_type.is_dynamic();
    let reversion = |s: &Signal| s.signal_type.is_reversion();
    let reversion_or_dynamic = |s: &Signal| s.signal_type.is_reversion() || s.signal_type.is_dynamic();

    let candidates = match trend {
        Trend::Up => {
            if buys.iter().any(|s| technical_or_dynamic(s)) {
                (Side::Buy, buys.to_vec(), "with-trend buys")
            } else {
                (Side::Sell, with_side(reversion, sells), "counter-trend reversion sells")
            }
        }
        Trend::Down => {
            if sells.iter().any(|s| technical_or_dynamic(s)) {
                (Side::Sell, sells.to_vec(), "with-trend sells")
            } else {
                (Side::Buy, with_side(reversion, buys), "counter-trend reversion buys")
            }
        }
        Trend::Neutral => {
            let neutral_buys = with_side(reversion_or_dynamic, buys);
            if neutral_buys.is_empty() {
                (
                    Side::Sell,
                    with_side(reversion_or_dynamic, sells),
                    "range reversion/dynamic sells",
                )
            } else {
                (Side::Buy, neutral_buys, "range reversion/dynamic buys")
            }
        }
    };

    let (side, signals, rule) = candidates;
    if signals.is_empty() {
        None
    } else {
        Some(Selection { side, signals, rule })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;

    fn snapshot(flag: Option<bool>, percentile: f64) -> RegimeSnapshot {
        RegimeSnapshot {
            rsi_4h: 55.0,
            daily_above_ema200: flag,
            atr_4h_percentile: percentile,
        }
    }

    fn signal(
        symbol: &str,
        side: Side,
        confidence: f64,
        signal_type: SignalType,
        scorer: &str,
        regime: Option<RegimeSnapshot>,
    ) -> Signal {
        let meta = SignalMeta {
            symbol: symbol.into(),
            pip_size: resolve_pip_size(None, symbol),
            candle_time: None,
            scorer: scorer.into(),
        };
        let mut s = Signal::directional(symbol, side, confidence, signal_type, 1.1000, "test", meta);
        s.recommended_sl_pips = Some(20.0);
        s.recommended_tp_pips = Some(30.0);
        s.regime = regime;
        s
    }

    fn flat_with(regime: Option<RegimeSnapshot>) -> Signal {
        let mut s = Signal::flat("EURUSD", SignalType::Breakout, "flat: outside session", SignalMeta::default());
        s.regime = regime;
        s
    }

    fn aggregate(signals: &[Signal]) -> Signal {
        Aggregator::from_config(&EngineConfig::default()).aggregate("EURUSD", signals, None)
    }

    #[test]
    fn no_snapshot_is_flat() {
        let out = aggregate(&[
            signal("EURUSD", Side::Buy, 0.8, SignalType::Momentum, "momentum", None),
            flat_with(None),
        ]);
        assert!(out.is_flat());
        assert_eq!(out.reason, "no valid indicator data");
        assert_eq!(out.signal_type, SignalType::Confluence);
        assert_eq!(out.meta.scorer, "confluence");
    }

    #[test]
    fn neutral_high_volatility_is_vetoed() {
        let regime = Some(snapshot(None, 0.9));
        let out = aggregate(&[signal("EURUSD", Side::Buy, 0.9, SignalType::Liquidity, "liquidity", regime)]);
        assert!(out.is_flat());
        assert!(out.reason.contains("volatile chop"));
        assert_eq!(out.regime, regime);
    }

    #[test]
    fn uptrend_approves_buys_and_averages() {
        let regime = Some(snapshot(Some(true), 0.4));
        let out = aggregate(&[
            flat_with(regime),
            signal("EURUSD", Side::Buy, 0.8, SignalType::Momentum, "momentum", None),
            signal("EURUSD", Side::Sell, 0.9, SignalType::MarketStructure, "market_structure", None),
            signal("EURUSD", Side::Buy, 0.6, SignalType::Liquidity, "liquidity", None),
        ]);
        assert_eq!(out.direction, Direction::Buy);
        assert!((out.confidence - 0.7).abs() < 1e-9);
        assert_eq!(out.signal_type, SignalType::Momentum);
        assert_eq!(out.indicators["agg.selected"], 2.0);
        assert_eq!(out.indicators["agg.buy_count"], 2.0);
        assert_eq!(out.indicators["agg.sell_count"], 1.0);
        assert!((out.recommended_sl_price.unwrap() - 1.0980).abs() < 1e-9);
        assert!((out.recommended_tp_price.unwrap() - 1.1030).abs() < 1e-9);
        assert!(out.reason.contains("best momentum"));
        assert!(out.is_well_formed());
    }

    #[test]
    fn uptrend_without_buys_fades_with_reversion_sells_only() {
        let regime = Some(snapshot(Some(true), 0.4));
        let out = aggregate(&[
            signal("EURUSD", Side::Sell, 0.9, SignalType::Momentum, "momentum", regime),
            signal("EURUSD", Side::Sell, 0.7, SignalType::Reversion, "mean_reversion", None),
        ]);
        assert_eq!(out.direction, Direction::Sell);
        assert!((out.confidence - 0.7).abs() < 1e-9);
        assert_eq!(out.signal_type, SignalType::Reversion);

        let out = aggregate(&[signal("EURUSD", Side::Sell, 0.9, SignalType::Momentum, "momentum", regime)]);
        assert!(out.is_flat());
        assert!(out.reason.contains("no signals match"));
    }

    #[test]
    fn downtrend_mirrors() {
        let regime = Some(snapshot(Some(false), 0.9));
        let out = aggregate(&[
            signal("EURUSD", Side::Buy, 0.9, SignalType::Momentum, "momentum", regime),
            signal("EURUSD", Side::Sell, 0.65, SignalType::VwapBias, "vwap_bias", None),
        ]);
        assert_eq!(out.direction, Direction::Sell);
        assert!((out.recommended_sl_price.unwrap() - 1.1020).abs() < 1e-9);
    }

    #[test]
    fn neutral_low_volatility_only_takes_reversion_or_dynamic() {
        let regime = Some(snapshot(None, 0.3));
        let out = aggregate(&[
            signal("EURUSD", Side::Buy, 0.9, SignalType::Momentum, "momentum", regime),
            signal("EURUSD", Side::Sell, 0.6, SignalType::Liquidity, "liquidity", None),
        ]);
        assert_eq!(out.direction, Direction::Sell);
        assert_eq!(out.indicators["agg.selected"], 1.0);

        let out = aggregate(&[
            signal("EURUSD", Side::Buy, 0.9, SignalType::Momentum, "momentum", regime),
            signal("EURUSD", Side::Buy, 0.6, SignalType::Breakout, "breakout_retest", None),
        ]);
        assert!(out.is_flat());
    }

    #[test]
    fn ties_keep_the_first_signal() {
        let regime = Some(snapshot(Some(true), 0.4));
        let out = aggregate(&[
            signal("EURUSD", Side::Buy, 0.7, SignalType::Breakout, "breakout_retest", regime),
            signal("EURUSD", Side::Buy, 0.7, SignalType::Liquidity, "liquidity", None),
        ]);
        assert_eq!(out.signal_type, SignalType::Breakout);
    }

    #[test]
    fn jpy_pip_size_materializes_prices() {
        let regime = Some(snapshot(Some(true), 0.4));
        let mut buy = signal("USDJPY", Side::Buy, 0.8, SignalType::Momentum, "momentum", regime);
        buy.price = Some(150.00);
        let out = Aggregator::from_config(&EngineConfig::default()).aggregate("USDJPY", &[buy], None);
        assert_eq!(out.meta.pip_size, 0.01);
        assert!((out.recommended_sl_price.unwrap() - 149.80).abs() < 1e-9);
        assert!((out.recommended_tp_price.unwrap() - 150.30).abs() < 1e-9);
    }

    #[test]
    fn stop_price_only_is_converted_to_pips() {
        let regime = Some(snapshot(Some(true), 0.4));
        let mut buy = signal("EURUSD", Side::Buy, 0.85, SignalType::Breakout, "breakout_retest", regime);
        buy.recommended_sl_pips = None;
        buy.recommended_sl_price = Some(1.0990);
        let out = aggregate(&[buy]);
        assert!((out.recommended_sl_pips.unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn mixed_symbols_degrade_to_flat() {
        let regime = Some(snapshot(Some(true), 0.4));
        let out = aggregate(&[signal("GBPUSD", Side::Buy, 0.8, SignalType::Momentum, "momentum", regime)]);
        assert!(out.is_flat());
        assert!(out.reason.starts_with("aggregation error"));
        assert_eq!(out.symbol, "EURUSD");
    }

    #[test]
    fn aggregation_is_deterministic() {
        let regime = Some(snapshot(Some(true), 0.4));
        let signals = vec![
            signal("EURUSD", Side::Buy, 0.8, SignalType::Momentum, "momentum", regime),
            signal("EURUSD", Side::Buy, 0.6, SignalType::Liquidity, "liquidity", None),
        ];
        assert_eq!(aggregate(&signals), aggregate(&signals));
    }
}
