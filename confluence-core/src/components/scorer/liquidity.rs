//! Liquidity scorer — trades retracements into unfilled fair value gaps.
//!
//! Bias from the daily EMA. Scans the newest 1h candles for gaps in the bias
//! direction that no later candle has filled, and takes the one nearest to
//! price if it lies within `max_distance_atr_mult * ATR(1h)`. The stop goes
//! a buffer beyond the far edge of the gap; the target is a fixed multiple of
//! that risk.

use crate::config::{EngineConfig, LiquidityConfig};
use crate::domain::{ScorerKind, Side, SignalType, Timeframe};
use crate::indicators::{detect_fvgs, FairValueGap, GapKind};

use super::{Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};

#[derive(Debug, Clone)]
pub struct LiquidityScorer {
    params: LiquidityConfig,
    daily_ema_period: usize,
}

impl LiquidityScorer {
    pub fn new(params: LiquidityConfig, daily_ema_period: usize) -> Self {
        Self {
            params,
            daily_ema_period,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.liquidity.clone(), config.daily_ema_period)
    }

    /// Nearest unfilled gap of the bias kind within `max_distance` of price.
    pub fn select_gap(
        &self,
        candles: &[crate::domain::Candle],
        side: Side,
        price: f64,
        max_distance: f64,
    ) -> Option<FairValueGap> {
        let kind = match side {
            Side::Buy => GapKind::Bullish,
            Side::Sell => GapKind::Bearish,
        };
        detect_fvgs(candles)
            .into_iter()
            .rev()
            .filter(|g| g.kind == kind && !g.is_filled(candles))
            .filter(|g| g.distance_to(price) <= max_distance)
            .min_by(|a, b| a.distance_to(price).total_cmp(&b.distance_to(price)))
    }
}

impl Scorer for LiquidityScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Liquidity
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![
            Requirement::new(Timeframe::Daily, self.daily_ema_period),
            Requirement::new(Timeframe::H1, 3),
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto> {
        let p = &self.params;
        let side = ctx.daily_bias(trace)?;

        let price = ctx.price_15m;
        let candles = ctx.bundle.data_1h.tail(p.scan_window);
        let max_distance = p.max_distance_atr_mult * ctx.atr_1h;
        trace.record("price", price);

        let gap = self
            .select_gap(candles, side, price, max_distance)
            .ok_or_else(|| {
                Veto::NoEntry(format!(
                    "no unfilled {} gap within {max_distance:.5} of price",
                    match side {
                        Side::Buy => "bullish",
                        Side::Sell => "bearish",
                    }
                ))
            })?;
        trace.record("fvg_top", gap.top);
        trace.record("fvg_bottom", gap.bottom);
        trace.note(format!(
            "unfilled 1h gap {:.5}..{:.5} from {}",
            gap.bottom,
            gap.top,
            gap.time.format("%Y-%m-%d %H:%M")
        ));

        let confidence = ctx.apply_floor(p.confidence, trace)?;

        let buffer = p.stop_buffer_atr_mult * ctx.atr_1h;
        let stop = match side {
            Side::Buy => gap.bottom - buffer,
            Side::Sell => gap.top + buffer,
        };
        let risk = (price - stop) * side.sign();
        if risk <= 0.0 {
            return Err(Veto::NoTarget(format!("stop {stop:.5} is not behind price")));
        }
        let target = price + side.sign() * p.reward_multiple * risk;
        trace.note(format!("TP at {}R", p.reward_multiple));

        Ok(Setup {
            side,
            signal_type: SignalType::Liquidity,
            confidence,
            price,
            stop: Offset::Price(stop),
            target: Offset::Price(target),
        })
    }
}
