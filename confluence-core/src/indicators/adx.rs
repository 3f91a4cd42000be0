//! ADX — Average Directional Index (Wilder), with the directional indicators.
//!
//! Steps:
//! 1. +DM = up-move if it exceeds the down-move and is positive, else 0 (mirror for -DM)
//! 2. Wilder-smooth +DM, -DM, and TR
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX, seeded by the mean of the first `period` DX values
//!
//! Lookback: 2 * period - 1 (period for DI smoothing, then period - 1 more for ADX).

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::{Candle, CandleSeries};
use crate::indicators::atr::{true_range, wilder_smooth};

/// ADX with its directional indicators at one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxReading {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Full ADX output series.
#[derive(Debug, Clone, Default)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }

    /// Compute ADX, +DI and -DI over a chronological slice.
    pub fn compute_components(&self, candles: &[Candle]) -> AdxSeries {
        let n = candles.len();
        let nan = vec![f64::NAN; n];
        if n < 2 {
            return AdxSeries {
                adx: nan.clone(),
                plus_di: nan.clone(),
                minus_di: nan,
            };
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];

        for i in 1..n {
            let (cur, prev) = (&candles[i], &candles[i - 1]);
            if cur.high.is_nan() || cur.low.is_nan() || prev.high.is_nan() || prev.low.is_nan() {
                continue;
            }
            let up_move = cur.high - prev.high;
            let down_move = prev.low - cur.low;

            plus_dm[i] = if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            };
            minus_dm[i] = if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            };
        }

        let mut tr = true_range(candles);
        tr[0] = f64::NAN;
        let smooth_tr = wilder_smooth(&tr, self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let mut plus_di = vec![f64::NAN; n];
        let mut minus_di = vec![f64::NAN; n];
        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            if smooth_tr[i].is_nan()
                || smooth_plus[i].is_nan()
                || smooth_minus[i].is_nan()
                || smooth_tr[i] == 0.0
            {
                continue;
            }

            plus_di[i] = 100.0 * smooth_plus[i] / smooth_tr[i];
            minus_di[i] = 100.0 * smooth_minus[i] / smooth_tr[i];
            let di_sum = plus_di[i] + minus_di[i];

            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di[i] - minus_di[i]).abs() / di_sum
            };
        }

        AdxSeries {
            adx: wilder_smooth(&dx, self.period),
            plus_di,
            minus_di,
        }
    }

    /// ADX, +DI and -DI at the newest candle.
    pub fn latest_reading(&self, series: &CandleSeries) -> Option<AdxReading> {
        let out = self.compute_components(series.chronological());
        let adx = *out.adx.last()?;
        let plus_di = *out.plus_di.last()?;
        let minus_di = *out.minus_di.last()?;
        if adx.is_finite() && plus_di.is_finite() && minus_di.is_finite() {
            Some(AdxReading {
                adx,
                plus_di,
                minus_di,
            })
        } else {
            None
        }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        self.compute_components(candles).adx
    }
}
