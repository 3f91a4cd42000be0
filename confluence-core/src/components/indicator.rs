//! Indicator trait.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! They run over the chronological (oldest-first) view of a `CandleSeries`
//! so recurrences move forward in time; callers that only need the current
//! value use `latest`, which maps warm-up and invalid output to `None`.

use crate::domain::{Candle, CandleSeries};

/// Trait for single-series indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `candles`. The first
/// `lookback()` values are `f64::NAN` (warmup), and too-short input yields an
/// all-NaN series rather than an error.
///
/// # Look-ahead contamination guard
/// No indicator value at candle t may depend on price data from candle t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over a chronological candle slice.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;

    /// Value at the newest candle, or `None` on insufficient data.
    fn latest(&self, series: &CandleSeries) -> Option<f64> {
        last_valid(&self.compute(series.chronological()))
    }
}

/// The final element of a series if it is a finite number.
pub fn last_valid(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| v.is_finite())
}
