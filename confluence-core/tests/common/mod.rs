//! Shared bundle builders for the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use confluence_core::domain::{BundleMeta, Candle, CandleBundle, CandleSeries};

/// A timestamp at the given UTC hour on 2024-03-04.
pub fn at_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
}

/// Chronological candles from closes; open = previous close, high/low pad by `wick`.
pub fn series(closes: &[f64], end: DateTime<Utc>, step: Duration, wick: f64) -> CandleSeries {
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

/// Closes built from straight legs of `(steps, slope)`.
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

/// Every timeframe filled from a gentle sideways drift around `price`.
///
/// The 4h ATR history spans 0.0001..0.0100, so the current 4h ATR sits in
/// the low percentiles.
pub fn quiet_bundle(symbol: &str, price: f64, end: DateTime<Utc>) -> CandleBundle {
    let wick = price * 0.0005;
    let amp = price * 0.0003;
    CandleBundle {
        symbol: symbol.into(),
        data_5m: series(&drift(60, price, 0.0, amp), end, Duration::minutes(5), wick),
        data_15m: series(&drift(120, price, 0.0, amp), end, Duration::minutes(15), wick),
        data_1h: series(&drift(120, price, 0.0, amp), end, Duration::hours(1), wick),
        data_4h: series(&drift(120, price, 0.0, amp), end, Duration::hours(4), wick),
        data_daily: series(&drift(220, price, 0.0, amp), end, Duration::days(1), wick),
        hist_atr_4h: (1..=100).map(|i| i as f64 * 0.0001).collect(),
        meta: BundleMeta {
            symbol: symbol.into(),
            pip_size: None,
        },
    }
}

/// Daily closes climbing steadily into `price`.
pub fn ascending_daily(price: f64, end: DateTime<Utc>) -> CandleSeries {
    series(&piecewise(price - 0.219, &[(219, 0.001)]), end, Duration::days(1), 0.002)
}
