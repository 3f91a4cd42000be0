//! Candle — the fundamental market data unit, and the per-timeframe series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timeframe of a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1day")]
    Daily,
}

impl Timeframe {
    pub fn label(&self) -> &'static str {
        match self {
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::Daily => "1day",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// OHLC candle with optional volume and provider-supplied typical price.
///
/// `typical` is (high + low + close) / 3 when the provider derives it. It stays
/// optional because VWAP must treat a missing value as insufficient data rather
/// than silently recomputing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical: Option<f64>,
}

impl Candle {
    /// High-low range of the candle.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Supplied typical price, if the provider sent one.
    pub fn typical_price(&self) -> Option<f64> {
        self.typical
    }
}

/// Candles for one timeframe.
///
/// The wire format is newest-first. Internally candles are kept in
/// chronological order so the indicator library can run forward recurrences;
/// the `latest`/`nth_latest` accessors present the newest-first view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Candle>", into = "Vec<Candle>")]
pub struct CandleSeries {
    chronological: Vec<Candle>,
}

impl CandleSeries {
    /// Build from a newest-first vector (the provider's ordering).
    pub fn from_newest_first(candles: Vec<Candle>) -> Self {
        Self::from(candles)
    }

    /// Build from a chronological (oldest-first) vector.
    pub fn from_chronological(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.time);
        Self {
            chronological: candles,
        }
    }

    pub fn len(&self) -> usize {
        self.chronological.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chronological.is_empty()
    }

    /// Oldest-first view, as consumed by `Indicator::compute`.
    pub fn chronological(&self) -> &[Candle] {
        &self.chronological
    }

    /// The most recent `n` candles, oldest-first.
    pub fn tail(&self, n: usize) -> &[Candle] {
        let start = self.chronological.len().saturating_sub(n);
        &self.chronological[start..]
    }

    /// The current (newest) candle.
    pub fn latest(&self) -> Option<&Candle> {
        self.chronological.last()
    }

    /// The candle before the current one.
    pub fn previous(&self) -> Option<&Candle> {
        self.nth_latest(1)
    }

    /// Newest-first indexing: 0 is the current candle.
    pub fn nth_latest(&self, n: usize) -> Option<&Candle> {
        let len = self.chronological.len();
        if n >= len {
            return None;
        }
        self.chronological.get(len - 1 - n)
    }

    /// Close of the current candle.
    pub fn last_close(&self) -> Option<f64> {
        self.latest().map(|c| c.close)
    }

    /// True if every candle in the most recent `window` carries both volume and typical price.
    pub fn has_volume_and_typical(&self, window: usize) -> bool {
        let tail = self.tail(window);
        !tail.is_empty()
            && tail
                .iter()
                .all(|c| c.volume.is_some() && c.typical.is_some())
    }
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(mut newest_first: Vec<Candle>) -> Self {
        newest_first.reverse();
        Self::from_chronological(newest_first)
    }
}

impl From<CandleSeries> for Vec<Candle> {
    fn from(series: CandleSeries) -> Self {
        let mut candles = series.chronological;
        candles.reverse();
        candles
    }
}
