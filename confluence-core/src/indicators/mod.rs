//! Indicator library.
//!
//! Single-series indicators implement the `Indicator` trait from
//! `components::indicator`. Multi-output indicators (Bollinger, ADX,
//! Stochastic RSI) return typed readings for the newest candle, and the
//! pattern detectors (FVG) return structured gaps.
//!
//! Insufficient data never errors: series come back as NaN and `latest`
//! readings as `None`. Scorers turn that into an insufficient-data veto.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod fvg;
pub mod percentile;
pub mod rsi;
pub mod sma;
pub mod stoch_rsi;
pub mod vwap;

pub use adx::{Adx, AdxReading};
pub use atr::{true_range, wilder_smooth, Atr};
pub use bollinger::{Bollinger, BollingerBands};
pub use ema::{ema_of_series, Ema};
pub use fvg::{detect_fvgs, FairValueGap, GapKind};
pub use percentile::atr_percentile;
pub use rsi::{rsi_of_series, Rsi};
pub use sma::sma_of_series;
pub use stoch_rsi::{StochRsi, StochRsiReading};
pub use vwap::Vwap;

/// Create synthetic chronological candles from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, hourly spacing,
/// volume 1000 and a derived typical price.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Candle {
                time: base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: Some(1000.0),
                typical: Some((high + low + close) / 3.0),
            }
        })
        .collect()
}

/// Create chronological candles from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            time: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume: None,
            typical: None,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
