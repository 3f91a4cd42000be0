//! VWAP bias scorer.
//!
//! Needs volume and typical price on both the 1h and 15m windows; a provider
//! without volume makes this scorer flat with a missing-field reason. Bias
//! from the daily EMA, confirmed by the 1h close on the same side of the 1h
//! VWAP. Entry when the 15m price has retraced into its own VWAP zone.

use crate::components::indicator::Indicator;
use crate::config::{EngineConfig, VwapBiasConfig};
use crate::domain::{ScorerKind, SignalType, Timeframe};
use crate::indicators::Vwap;

use super::levels::in_zone;
use super::{Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};

#[derive(Debug, Clone)]
pub struct VwapBiasScorer {
    params: VwapBiasConfig,
    daily_ema_period: usize,
}

impl VwapBiasScorer {
    pub fn new(params: VwapBiasConfig, daily_ema_period: usize) -> Self {
        Self {
            params,
            daily_ema_period,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.vwap_bias.clone(), config.daily_ema_period)
    }
}

impl Scorer for VwapBiasScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::VwapBias
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![
            Requirement::new(Timeframe::Daily, self.daily_ema_period),
            Requirement::new(Timeframe::H1, self.params.h1_window),
            Requirement::new(Timeframe::M15, self.params.m15_window),
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto> {
        let p = &self.params;
        let h1 = &ctx.bundle.data_1h;
        let m15 = &ctx.bundle.data_15m;
        if !h1.has_volume_and_typical(p.h1_window) || !m15.has_volume_and_typical(p.m15_window) {
            return Err(Veto::MissingField("volume/typical"));
        }

        let side = ctx.daily_bias(trace)?;

        let vwap_1h = Vwap::new(p.h1_window)
            .latest(h1)
            .ok_or(Veto::IndicatorUnavailable("vwap_1h"))?;
        let close_1h = h1.last_close().ok_or(Veto::MissingField("1h close"))?;
        trace.record("vwap_1h", vwap_1h);
        trace.record("close_1h", close_1h);
        if (close_1h - vwap_1h) * side.sign() <= 0.0 {
            return Err(Veto::NoEntry(format!(
                "1h close {close_1h:.5} does not confirm {side} against VWAP {vwap_1h:.5}"
            )));
        }
        trace.note(format!("1h close confirms {side} vs VWAP"));

        let vwap_15m = Vwap::new(p.m15_window)
            .latest(m15)
            .ok_or(Veto::IndicatorUnavailable("vwap_15m"))?;
        let price = ctx.price_15m;
        let zone = p.zone_atr_mult * ctx.atr_1h;
        trace.record("vwap_15m", vwap_15m);
        trace.record("price", price);
        if !in_zone(price, vwap_15m, zone) {
            return Err(Veto::NoEntry(format!(
                "15m price {price:.5} outside VWAP zone {vwap_15m:.5} +/- {zone:.5}"
            )));
        }
        trace.note("15m retrace into VWAP zone");

        let confidence = ctx.apply_floor(p.confidence, trace)?;
        let sl_pips = ctx.atr_stop_pips(p.min_sl_pips, p.sl_atr_mult);
        let tp_pips = p.tp_sl_mult * sl_pips;

        Ok(Setup {
            side,
            signal_type: SignalType::VwapBias,
            confidence,
            price,
            stop: Offset::Pips(sl_pips),
            target: Offset::Pips(tp_pips),
        })
    }
}
