//! Values shared by every scorer, computed once per bundle.

use crate::components::indicator::Indicator;
use crate::config::EngineConfig;
use crate::domain::{CandleBundle, PivotSet, RegimeSnapshot, Side};
use crate::indicators::{atr_percentile, Atr, Ema, Rsi};

use super::{Trace, Veto};

/// Immutable view of one symbol's inputs plus the shared derived values.
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub bundle: &'a CandleBundle,
    pub pivots: &'a PivotSet,
    pub config: &'a EngineConfig,
    pub pip_size: f64,
    /// ATR on the 1h series; sizes S/R zones and stops.
    pub atr_1h: f64,
    /// ATR on the 15m series; the volatility-spike yardstick.
    pub atr_15m: f64,
    /// Close of the newest 15m candle: the decision price.
    pub price_15m: f64,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        bundle: &'a CandleBundle,
        pivots: &'a PivotSet,
        config: &'a EngineConfig,
    ) -> Result<Self, Veto> {
        let atr = Atr::new(config.atr_period);
        let atr_1h = atr
            .latest(&bundle.data_1h)
            .ok_or(Veto::IndicatorUnavailable("atr_1h"))?;
        let atr_15m = atr
            .latest(&bundle.data_15m)
            .ok_or(Veto::IndicatorUnavailable("atr_15m"))?;
        let price_15m = bundle
            .data_15m
            .last_close()
            .ok_or(Veto::MissingField("15m close"))?;
        Ok(Self {
            bundle,
            pivots,
            config,
            pip_size: bundle.pip_size(),
            atr_1h,
            atr_15m,
            price_15m,
        })
    }

    /// Half-width of the S/R zone around each level.
    pub fn zone(&self) -> f64 {
        self.atr_1h * self.config.sr_zone_atr_mult
    }

    pub fn to_pips(&self, distance: f64) -> f64 {
        distance / self.pip_size
    }

    /// `max(min_pips, mult * ATR(1h))`, in pips.
    pub fn atr_stop_pips(&self, min_pips: f64, mult: f64) -> f64 {
        min_pips.max(self.to_pips(mult * self.atr_1h))
    }

    /// Clamp to [0, 1] and veto below the configured floor.
    pub fn apply_floor(&self, confidence: f64, trace: &mut Trace) -> Result<f64, Veto> {
        let confidence = confidence.clamp(0.0, 1.0);
        trace.record("confidence", confidence);
        let floor = self.config.min_confidence;
        if confidence < floor {
            return Err(Veto::ConfidenceFloor { confidence, floor });
        }
        Ok(confidence)
    }

    /// Daily close against the daily EMA: buy above, sell below.
    pub fn daily_bias(&self, trace: &mut Trace) -> Result<Side, Veto> {
        let daily = &self.bundle.data_daily;
        let ema = Ema::new(self.config.daily_ema_period)
            .latest(daily)
            .ok_or(Veto::IndicatorUnavailable("ema_daily"))?;
        let close = daily
            .last_close()
            .ok_or(Veto::MissingField("daily close"))?;
        trace.record("ema_daily", ema);
        trace.record("close_daily", close);
        let side = if close > ema {
            Side::Buy
        } else if close < ema {
            Side::Sell
        } else {
            return Err(Veto::NoBias(format!("daily close {close:.5} on EMA")));
        };
        trace.note(format!("daily bias {side} (close {close:.5} vs EMA {ema:.5})"));
        Ok(side)
    }
}

/// The regime indicators the aggregator classifies on.
///
/// `None` when the 4h RSI or the 4h ATR percentile cannot be computed. The
/// daily EMA flag is optional inside the snapshot: too little daily history
/// leaves it `None`, which the aggregator reads as a neutral trend.
pub fn regime_snapshot(bundle: &CandleBundle, config: &EngineConfig) -> Option<RegimeSnapshot> {
    let rsi_4h = Rsi::new(config.rsi_period).latest(&bundle.data_4h)?;
    let atr_4h = Atr::new(config.atr_period).latest(&bundle.data_4h)?;
    let atr_4h_percentile = atr_percentile(atr_4h, &bundle.hist_atr_4h)?;
    let daily = &bundle.data_daily;
    let daily_above_ema200 = Ema::new(config.daily_ema_period)
        .latest(daily)
        .zip(daily.last_close())
        .map(|(ema, close)| close > ema);
    Some(RegimeSnapshot {
        rsi_4h,
        daily_above_ema200,
        atr_4h_percentile,
    })
}
