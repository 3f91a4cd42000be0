//! Signal — the per-scorer and per-symbol decision record.
//!
//! Signals are created fresh every cycle and never persisted. Constructors
//! enforce the record invariants: exactly one direction holds, confidence lies
//! in [0, 1], and a flat signal always carries confidence 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::pivots::PivotSet;

/// Final direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Flat,
}

impl Direction {
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Self::Buy => Some(Side::Buy),
            Self::Sell => Some(Side::Sell),
            Self::Flat => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Flat => "flat",
        })
    }
}

/// Side of a directional setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells: multiply a favorable distance to get a price offset.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Buy => Direction::Buy,
            Self::Sell => Direction::Sell,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.direction().fmt(f)
    }
}

/// Strategy tag carried by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Momentum,
    Reversion,
    Breakout,
    Liquidity,
    MarketStructure,
    VwapBias,
    /// Output of the aggregator when no contributor was selected.
    Confluence,
}

impl SignalType {
    /// Trend/oscillator archetypes.
    pub fn is_technical(&self) -> bool {
        matches!(self, Self::Momentum | Self::Reversion | Self::Breakout)
    }

    /// Level- and flow-driven archetypes.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::VwapBias | Self::Liquidity | Self::MarketStructure)
    }

    pub fn is_reversion(&self) -> bool {
        matches!(self, Self::Reversion)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Momentum => "momentum",
            Self::Reversion => "reversion",
            Self::Breakout => "breakout",
            Self::Liquidity => "liquidity",
            Self::MarketStructure => "market_structure",
            Self::VwapBias => "vwap_bias",
            Self::Confluence => "confluence",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six scorer archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Momentum,
    BreakoutRetest,
    MeanReversion,
    Liquidity,
    MarketStructure,
    VwapBias,
}

impl ScorerKind {
    pub const ALL: [ScorerKind; 6] = [
        Self::Momentum,
        Self::BreakoutRetest,
        Self::MeanReversion,
        Self::Liquidity,
        Self::MarketStructure,
        Self::VwapBias,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Momentum => "momentum",
            Self::BreakoutRetest => "breakout_retest",
            Self::MeanReversion => "mean_reversion",
            Self::Liquidity => "liquidity",
            Self::MarketStructure => "market_structure",
            Self::VwapBias => "vwap_bias",
        }
    }

    /// Tag used on this scorer's signals unless the scorer picks a narrower one.
    pub fn default_signal_type(&self) -> SignalType {
        match self {
            Self::Momentum => SignalType::Momentum,
            Self::BreakoutRetest => SignalType::Breakout,
            Self::MeanReversion => SignalType::Reversion,
            Self::Liquidity => SignalType::Liquidity,
            Self::MarketStructure => SignalType::MarketStructure,
            Self::VwapBias => SignalType::VwapBias,
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The indicator snapshot the aggregator needs to classify the regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeSnapshot {
    /// RSI(14) on the 4-hour series.
    pub rsi_4h: f64,
    /// Daily close above the daily 200-EMA. `None` when the daily history is too short.
    pub daily_above_ema200: Option<bool>,
    /// Percentile of the current 4h ATR within the supplied ATR history, in [0, 1].
    pub atr_4h_percentile: f64,
}

/// Provenance metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMeta {
    pub symbol: String,
    pub pip_size: f64,
    /// Open time of the newest 15m candle the decision was made on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candle_time: Option<DateTime<Utc>>,
    /// Scorer (or "confluence") that produced the record.
    pub scorer: String,
}

/// A trading decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub signal_type: SignalType,
    pub price: Option<f64>,
    #[serde(rename = "recommendedSLPips")]
    pub recommended_sl_pips: Option<f64>,
    #[serde(rename = "recommendedSLPrice")]
    pub recommended_sl_price: Option<f64>,
    #[serde(rename = "recommendedTPPips")]
    pub recommended_tp_pips: Option<f64>,
    #[serde(rename = "recommendedTPPrice")]
    pub recommended_tp_price: Option<f64>,
    /// Human-readable trace of the decision path, ending with the terminal decision.
    pub reason: String,
    /// Named snapshot of the values the decision used. Sorted for stable output.
    pub indicators: BTreeMap<String, f64>,
    pub regime: Option<RegimeSnapshot>,
    pub sr_data: Option<PivotSet>,
    pub meta: SignalMeta,
}

impl Signal {
    /// A no-trade record. Confidence is always 0.
    pub fn flat(
        symbol: impl Into<String>,
        signal_type: SignalType,
        reason: impl Into<String>,
        meta: SignalMeta,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction: Direction::Flat,
            confidence: 0.0,
            signal_type,
            price: None,
            recommended_sl_pips: None,
            recommended_sl_price: None,
            recommended_tp_pips: None,
            recommended_tp_price: None,
            reason: reason.into(),
            indicators: BTreeMap::new(),
            regime: None,
            sr_data: None,
            meta,
        }
    }

    /// A directional record with confidence clamped to [0, 1].
    pub fn directional(
        symbol: impl Into<String>,
        side: Side,
        confidence: f64,
        signal_type: SignalType,
        price: f64,
        reason: impl Into<String>,
        meta: SignalMeta,
    ) -> Self {
        Self {
            direction: side.direction(),
            confidence: clamp_confidence(confidence),
            price: Some(price),
            ..Self::flat(symbol, signal_type, reason, meta)
        }
    }

    pub fn is_flat(&self) -> bool {
        self.direction.is_flat()
    }

    pub fn side(&self) -> Option<Side> {
        self.direction.side()
    }

    /// Check the record invariants. Used by tests and by the runner's output guard.
    pub fn is_well_formed(&self) -> bool {
        let confidence_ok = (0.0..=1.0).contains(&self.confidence);
        let flat_ok = !self.is_flat() || self.confidence == 0.0;
        confidence_ok && flat_ok && !self.reason.is_empty()
    }
}

/// Clamp a confidence into [0, 1]; NaN collapses to 0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
