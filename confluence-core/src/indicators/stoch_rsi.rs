//! Stochastic RSI.
//!
//! 1. RSI(rsi_period) over closes
//! 2. Raw stochastic of the RSI over a rolling `stoch_period` window:
//!    100 * (rsi - min) / (max - min), 0 when the window has no range
//! 3. %K = SMA(k_period) of the raw stochastic
//! 4. %D = SMA(d_period) of %K
//!
//! `Indicator::compute` returns %K.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::{Candle, CandleSeries};
use crate::indicators::rsi::rsi_of_series;
use crate::indicators::sma::sma_of_series;

/// %K and %D at one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochRsiReading {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Clone)]
pub struct StochRsi {
    rsi_period: usize,
    stoch_period: usize,
    k_period: usize,
    d_period: usize,
    name: String,
}

impl StochRsi {
    pub fn new(rsi_period: usize, stoch_period: usize, k_period: usize, d_period: usize) -> Self {
        assert!(
            rsi_period >= 1 && stoch_period >= 1 && k_period >= 1 && d_period >= 1,
            "StochRSI periods must be >= 1"
        );
        Self {
            rsi_period,
            stoch_period,
            k_period,
            d_period,
            name: format!("stoch_rsi_{rsi_period}_{stoch_period}_{k_period}_{d_period}"),
        }
    }

    /// (%K, %D) series over a chronological slice.
    pub fn compute_lines(&self, candles: &[Candle]) -> (Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let rsi = rsi_of_series(&closes, self.rsi_period);

        let n = rsi.len();
        let mut raw = vec![f64::NAN; n];
        if n >= self.stoch_period {
            for i in (self.stoch_period - 1)..n {
                let window = &rsi[i + 1 - self.stoch_period..=i];
                if window.iter().any(|v| v.is_nan()) {
                    continue;
                }
                let min = window.iter().copied().fold(f64::INFINITY, f64::min);
                let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                raw[i] = if max - min == 0.0 {
                    0.0
                } else {
                    100.0 * (rsi[i] - min) / (max - min)
                };
            }
        }

        let k = sma_of_series(&raw, self.k_period);
        let d = sma_of_series(&k, self.d_period);
        (k, d)
    }

    /// %K and %D at the newest candle.
    pub fn latest_reading(&self, series: &CandleSeries) -> Option<StochRsiReading> {
        let (k, d) = self.compute_lines(series.chronological());
        let k = *k.last()?;
        let d = *d.last()?;
        if k.is_finite() && d.is_finite() {
            Some(StochRsiReading { k, d })
        } else {
            None
        }
    }
}

impl Indicator for StochRsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.rsi_period + self.stoch_period + self.k_period + self.d_period - 3
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        self.compute_lines(candles).0
    }
}
