//! Break-and-retest scorer.
//!
//! Only active inside the configured UTC session windows. Bias is the 4h
//! close against the 4h EMA(50). A buy needs the previous 15m close above
//! PDH, the current candle's low back inside the retest zone around PDH, the
//! current close still above it and 15m RSI above 55. Sells mirror on PDL.
//!
//! Stop sits one zone beyond the broken level. Target is R1 (S1), escalating
//! to R2 (S2) when R1 pays less than the risk.

use chrono::Timelike;

use crate::components::indicator::Indicator;
use crate::config::{BreakoutRetestConfig, EngineConfig};
use crate::domain::{Level, ScorerKind, Side, SignalType, Timeframe};
use crate::indicators::{Ema, Rsi};

use super::levels::in_zone;
use super::{Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};

#[derive(Debug, Clone)]
pub struct BreakoutRetestScorer {
    params: BreakoutRetestConfig,
    rsi_period: usize,
}

impl BreakoutRetestScorer {
    pub fn new(params: BreakoutRetestConfig, rsi_period: usize) -> Self {
        Self { params, rsi_period }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.breakout_retest.clone(), config.rsi_period)
    }

    fn in_session(&self, hour: u32) -> bool {
        self.params.session_windows.iter().any(|w| w.contains(hour))
    }

    /// First pivot target beyond price that pays at least the risk, else the
    /// second one if it is beyond price at all.
    fn target(ctx: &ScoringContext<'_>, side: Side, price: f64, risk: f64) -> Result<Level, Veto> {
        let p = &ctx.pivots.pivots;
        let (first, second) = match side {
            Side::Buy => (("R1", p.r1), ("R2", p.r2)),
            Side::Sell => (("S1", p.s1), ("S2", p.s2)),
        };
        let beyond = |(name, level): (&'static str, Option<f64>)| {
            level
                .filter(|l| l.is_finite() && (l - price) * side.sign() > 0.0)
                .map(|price| Level { name, price })
        };
        if let Some(level) = beyond(first) {
            if (level.price - price).abs() >= risk {
                return Ok(level);
            }
        }
        beyond(second).ok_or_else(|| {
            Veto::NoTarget(format!("no {} / {} beyond price paying the risk", first.0, second.0))
        })
    }
}

impl Scorer for BreakoutRetestScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::BreakoutRetest
    }

    fn requirements(&self) -> Vec<Requirement> {
        let rsi = Rsi::new(self.rsi_period).lookback() + 1;
        vec![
            Requirement::new(Timeframe::H4, self.params.htf_ema_period),
            Requirement::new(Timeframe::M15, rsi.max(2)),
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto> {
        let p = &self.params;
        let m15 = &ctx.bundle.data_15m;
        let current = m15.latest().ok_or(Veto::MissingField("15m candle"))?;
        let previous = m15.previous().ok_or(Veto::MissingField("previous 15m candle"))?;

        let hour = current.time.hour();
        if !self.in_session(hour) {
            return Err(Veto::OutsideSession(hour));
        }
        trace.note(format!("in session (UTC hour {hour})"));

        let h4 = &ctx.bundle.data_4h;
        let ema_4h = Ema::new(p.htf_ema_period)
            .latest(h4)
            .ok_or(Veto::IndicatorUnavailable("ema_4h"))?;
        let close_4h = h4.last_close().ok_or(Veto::MissingField("4h close"))?;
        trace.record("ema_4h", ema_4h);
        trace.record("close_4h", close_4h);
        let side = if close_4h > ema_4h {
            Side::Buy
        } else if close_4h < ema_4h {
            Side::Sell
        } else {
            return Err(Veto::NoBias(format!("4h close {close_4h:.5} on EMA")));
        };
        trace.note(format!("4h bias {side}"));

        let (level_name, level) = match side {
            Side::Buy => ("PDH", ctx.pivots.pdh.ok_or(Veto::MissingField("PDH"))?),
            Side::Sell => ("PDL", ctx.pivots.pdl.ok_or(Veto::MissingField("PDL"))?),
        };
        let zone = ctx.atr_1h * p.retest_zone_atr_mult;
        let rsi_15m = Rsi::new(self.rsi_period)
            .latest(m15)
            .ok_or(Veto::IndicatorUnavailable("rsi_15m"))?;
        trace.record("level", level);
        trace.record("zone", zone);
        trace.record("rsi_15m", rsi_15m);

        let sign = side.sign();
        let broke = (previous.close - level) * sign > 0.0;
        let retest_extreme = match side {
            Side::Buy => current.low,
            Side::Sell => current.high,
        };
        let retested = in_zone(retest_extreme, level, zone);
        let held = (current.close - level) * sign > 0.0;
        let confirmed = match side {
            Side::Buy => rsi_15m > p.rsi_buy,
            Side::Sell => rsi_15m < p.rsi_sell,
        };
        if !broke {
            return Err(Veto::NoEntry(format!("previous close has not broken {level_name}")));
        }
        if !(retested && held) {
            return Err(Veto::NoEntry(format!("no retest of {level_name} within zone")));
        }
        if !confirmed {
            return Err(Veto::NoEntry(format!("RSI {rsi_15m:.1} does not confirm")));
        }
        trace.note(format!("break and retest of {level_name} {level:.5}"));

        let confidence = ctx.apply_floor(p.confidence, trace)?;

        let price = current.close;
        let stop = level - sign * zone;
        let risk = (price - stop).abs();
        let target = Self::target(ctx, side, price, risk)?;
        trace.note(format!("TP at {}", target.name));

        Ok(Setup {
            side,
            signal_type: SignalType::Breakout,
            confidence,
            price,
            stop: Offset::Price(stop),
            target: Offset::Price(target.price),
        })
    }
}
