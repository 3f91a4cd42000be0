//! Market structure scorer — break of structure (BOS) and change of character (CHOCH).
//!
//! A structure event is the 1h close crossing the previous day's extreme:
//! up through PDH (previous close at or below, current close above) or down
//! through PDL. 1h RSI must confirm the break direction (>55 up, <45 down).
//!
//! A break in the direction of the daily bias is a BOS continuation; a break
//! against it is a CHOCH and is traded in the break direction at a lower
//! confidence.

use crate::components::indicator::Indicator;
use crate::config::{EngineConfig, MarketStructureConfig};
use crate::domain::{ScorerKind, Side, SignalType, Timeframe};
use crate::indicators::Rsi;

use super::{Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};

/// A confirmed close through PDH or PDL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureBreak {
    pub side: Side,
    pub level: f64,
}

#[derive(Debug, Clone)]
pub struct MarketStructureScorer {
    params: MarketStructureConfig,
    rsi_period: usize,
    daily_ema_period: usize,
}

impl MarketStructureScorer {
    pub fn new(params: MarketStructureConfig, rsi_period: usize, daily_ema_period: usize) -> Self {
        Self {
            params,
            rsi_period,
            daily_ema_period,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.market_structure.clone(),
            config.rsi_period,
            config.daily_ema_period,
        )
    }

    /// The RSI-confirmed cross between `previous` and `current`, if any.
    pub fn detect_break(
        &self,
        previous: f64,
        current: f64,
        pdh: f64,
        pdl: f64,
        rsi: f64,
    ) -> Option<StructureBreak> {
        if previous <= pdh && current > pdh && rsi > self.params.rsi_buy {
            Some(StructureBreak {
                side: Side::Buy,
                level: pdh,
            })
        } else if previous >= pdl && current < pdl && rsi < self.params.rsi_sell {
            Some(StructureBreak {
                side: Side::Sell,
                level: pdl,
            })
        } else {
            None
        }
    }
}

impl Scorer for MarketStructureScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::MarketStructure
    }

    fn requirements(&self) -> Vec<Requirement> {
        let rsi = Rsi::new(self.rsi_period).lookback() + 1;
        vec![
            Requirement::new(Timeframe::Daily, self.daily_ema_period),
            Requirement::new(Timeframe::H1, rsi.max(2)),
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto> {
        let p = &self.params;
        let (pdh, pdl) = match (ctx.pivots.pdh, ctx.pivots.pdl) {
            (Some(h), Some(l)) => (h, l),
            _ => return Err(Veto::MissingField("PDH/PDL")),
        };
        let bias = ctx.daily_bias(trace)?;

        let h1 = &ctx.bundle.data_1h;
        let current = h1.latest().ok_or(Veto::MissingField("1h candle"))?.close;
        let previous = h1
            .previous()
            .ok_or(Veto::MissingField("previous 1h candle"))?
            .close;
        let rsi_1h = Rsi::new(self.rsi_period)
            .latest(h1)
            .ok_or(Veto::IndicatorUnavailable("rsi_1h"))?;
        trace.record("close_1h", current);
        trace.record("prev_close_1h", previous);
        trace.record("rsi_1h", rsi_1h);
        trace.record("pdh", pdh);
        trace.record("pdl", pdl);

        let event = self
            .detect_break(previous, current, pdh, pdl, rsi_1h)
            .ok_or_else(|| {
                Veto::NoEntry(format!(
                    "1h close {current:.5} made no confirmed cross of PDH {pdh:.5} / PDL {pdl:.5}"
                ))
            })?;

        let (confidence, label) = if event.side == bias {
            (p.break_confidence, "BOS")
        } else {
            (p.fade_confidence, "CHOCH")
        };
        trace.note(format!(
            "{label} {} through {:.5} (RSI {rsi_1h:.1})",
            event.side, event.level
        ));
        let confidence = ctx.apply_floor(confidence, trace)?;

        let sl_pips = ctx.atr_stop_pips(p.min_sl_pips, p.sl_atr_mult);
        let tp_pips = p.tp_sl_mult * sl_pips;

        Ok(Setup {
            side: event.side,
            signal_type: SignalType::MarketStructure,
            confidence,
            price: ctx.price_15m,
            stop: Offset::Pips(sl_pips),
            target: Offset::Pips(tp_pips),
        })
    }
}
