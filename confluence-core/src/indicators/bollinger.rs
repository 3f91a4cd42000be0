//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! `Indicator::compute` yields the middle band; `latest_bands` returns all
//! three. Uses population stddev (divide by N).
//! Lookback: period - 1.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::{Candle, CandleSeries};

/// All three bands at one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("bollinger_{period}_{multiplier}"),
        }
    }

    /// Bands over the `period` candles ending at `end` (inclusive).
    fn bands_at(&self, candles: &[Candle], end: usize) -> Option<BollingerBands> {
        if end + 1 < self.period {
            return None;
        }
        let window = &candles[end + 1 - self.period..=end];
        if window.iter().any(|c| c.close.is_nan()) {
            return None;
        }

        let mean = window.iter().map(|c| c.close).sum::<f64>() / self.period as f64;
        let variance = window
            .iter()
            .map(|c| {
                let diff = c.close - mean;
                diff * diff
            })
            .sum::<f64>()
            / self.period as f64;
        let stddev = variance.sqrt();

        Some(BollingerBands {
            upper: mean + self.multiplier * stddev,
            middle: mean,
            lower: mean - self.multiplier * stddev,
        })
    }

    /// All three bands at the newest candle, or `None` with fewer than `period` candles.
    pub fn latest_bands(&self, series: &CandleSeries) -> Option<BollingerBands> {
        let candles = series.chronological();
        if candles.is_empty() {
            return None;
        }
        self.bands_at(candles, candles.len() - 1)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    /// The middle band. Use `latest_bands` for all three.
    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        (0..candles.len())
            .map(|i| self.bands_at(candles, i).map_or(f64::NAN, |b| b.middle))
            .collect()
    }
}
