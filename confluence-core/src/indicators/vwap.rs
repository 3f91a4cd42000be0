//! Volume-Weighted Average Price (VWAP).
//!
//! Cumulative sum(typical * volume) / cumulative sum(volume), computed
//! chronologically over the supplied window. Requires both `volume` and
//! `typical` on every candle: a provider without volume data makes VWAP
//! unavailable, which callers treat as ordinary insufficient data.

use crate::components::indicator::{last_valid, Indicator};
use crate::domain::{Candle, CandleSeries};

#[derive(Debug, Clone)]
pub struct Vwap {
    window: usize,
    name: String,
}

impl Vwap {
    /// VWAP anchored `window` candles back from the newest candle.
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "VWAP window must be >= 1");
        Self {
            window,
            name: format!("vwap_{window}"),
        }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    /// Cumulative VWAP from the first candle of `candles`.
    ///
    /// A candle missing volume or typical price makes it and every later value NaN.
    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut result = vec![f64::NAN; candles.len()];
        let mut cum_pv = 0.0;
        let mut cum_vol = 0.0;

        for (i, candle) in candles.iter().enumerate() {
            let (Some(volume), Some(typical)) = (candle.volume, candle.typical_price()) else {
                return result;
            };
            if volume.is_nan() || typical.is_nan() {
                return result;
            }
            cum_pv += typical * volume;
            cum_vol += volume;
            if cum_vol > 0.0 {
                result[i] = cum_pv / cum_vol;
            }
        }

        result
    }

    /// VWAP over the newest `window` candles. `None` if any lacks volume or typical.
    fn latest(&self, series: &CandleSeries) -> Option<f64> {
        let tail = series.tail(self.window);
        if tail.is_empty() {
            return None;
        }
        last_valid(&self.compute(tail))
    }
}
