//! Momentum / pullback scorer.
//!
//! Bias: 4h close against the 4h EMA(50), confirmed by 4h RSI (>52 bull,
//! <48 bear). Entries on the 15m chart, checked in order:
//! - momentum: price beyond the 15m EMA(21) with RSI past 55/45
//! - reversion: RSI stretched against the bias (<35 for buys, >65 for sells)
//! - shallow pullback: price beyond the EMA with RSI past 40/60
//!
//! Confidence is the entry's base plus RSI-extremity bonuses on both
//! timeframes, capped at 1.0, then adjusted for S/R context. The 4h EMA is
//! the dynamic level. TP is the nearest resistance (buy) or support (sell)
//! level beyond price less half the S/R zone, with P and the dynamic level
//! eligible on either side, or a fixed multiple of the stop when that pays
//! less than the risk.

use crate::components::indicator::Indicator;
use crate::config::{EngineConfig, MomentumConfig};
use crate::domain::{Level, ScorerKind, Side, SignalType, Timeframe};
use crate::indicators::{Ema, Rsi};

use super::levels::{nearest_beyond, sr_context, target_levels};
use super::{Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};

#[derive(Debug, Clone)]
pub struct MomentumScorer {
    params: MomentumConfig,
    rsi_period: usize,
}

/// Distance of an RSI reading from 50, scaled so 80/20 and beyond score 1.
fn extremity(rsi: f64) -> f64 {
    ((rsi - 50.0).abs() / 30.0).min(1.0)
}

impl MomentumScorer {
    pub fn new(params: MomentumConfig, rsi_period: usize) -> Self {
        Self { params, rsi_period }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.momentum.clone(), config.rsi_period)
    }

    /// (signal type, base confidence, label) for the first matching entry rule.
    fn entry(&self, side: Side, price: f64, ema: f64, rsi: f64) -> Option<(SignalType, f64, &'static str)> {
        let p = &self.params;
        let (beyond_ema, momentum, reversion, pullback) = match side {
            Side::Buy => (
                price > ema,
                rsi > p.momentum_rsi_buy,
                rsi < p.reversion_rsi_buy,
                rsi > p.pullback_rsi_buy,
            ),
            Side::Sell => (
                price < ema,
                rsi < p.momentum_rsi_sell,
                rsi > p.reversion_rsi_sell,
                rsi < p.pullback_rsi_sell,
            ),
        };
        if beyond_ema && momentum {
            Some((SignalType::Momentum, p.base_momentum, "momentum"))
        } else if reversion {
            Some((SignalType::Reversion, p.base_reversion, "reversion"))
        } else if beyond_ema && pullback {
            Some((SignalType::Momentum, p.base_pullback, "shallow pullback"))
        } else {
            None
        }
    }

    fn target_pips(
        &self,
        ctx: &ScoringContext<'_>,
        side: Side,
        price: f64,
        dynamic: Level,
        sl_pips: f64,
        trace: &mut Trace,
    ) -> f64 {
        let levels = target_levels(side, ctx.pivots, Some(dynamic));
        if let Some(level) = nearest_beyond(side, price, &levels) {
            let target = level.price - side.sign() * ctx.zone() / 2.0;
            let reward = ctx.to_pips((target - price) * side.sign());
            if reward >= sl_pips {
                trace.note(format!("TP at {} less half zone ({reward:.1} pips)", level.name));
                return reward;
            }
        }
        let fallback = self.params.fallback_rr * sl_pips;
        trace.note(format!("TP fallback {}x stop", self.params.fallback_rr));
        fallback
    }
}

impl Scorer for MomentumScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Momentum
    }

    fn requirements(&self) -> Vec<Requirement> {
        let rsi = Rsi::new(self.rsi_period).lookback() + 1;
        vec![
            Requirement::new(Timeframe::H4, self.params.htf_ema_period.max(rsi)),
            Requirement::new(Timeframe::M15, self.params.ltf_ema_period.max(rsi)),
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto> {
        let p = &self.params;
        let h4 = &ctx.bundle.data_4h;
        let m15 = &ctx.bundle.data_15m;
        let rsi = Rsi::new(self.rsi_period);

        let ema_4h = Ema::new(p.htf_ema_period)
            .latest(h4)
            .ok_or(Veto::IndicatorUnavailable("ema_4h"))?;
        let rsi_4h = rsi.latest(h4).ok_or(Veto::IndicatorUnavailable("rsi_4h"))?;
        let close_4h = h4.last_close().ok_or(Veto::MissingField("4h close"))?;
        trace.record("ema_4h", ema_4h);
        trace.record("rsi_4h", rsi_4h);
        trace.record("close_4h", close_4h);

        let side = if close_4h > ema_4h && rsi_4h > p.htf_rsi_bull {
            Side::Buy
        } else if close_4h < ema_4h && rsi_4h < p.htf_rsi_bear {
            Side::Sell
        } else {
            return Err(Veto::NoBias(format!(
                "4h close {close_4h:.5} vs EMA {ema_4h:.5} with RSI {rsi_4h:.1}"
            )));
        };
        trace.note(format!("4h bias {side} (RSI {rsi_4h:.1})"));

        let price = ctx.price_15m;
        let ema_15m = Ema::new(p.ltf_ema_period)
            .latest(m15)
            .ok_or(Veto::IndicatorUnavailable("ema_15m"))?;
        let rsi_15m = rsi.latest(m15).ok_or(Veto::IndicatorUnavailable("rsi_15m"))?;
        trace.record("ema_15m", ema_15m);
        trace.record("rsi_15m", rsi_15m);
        trace.record("price", price);

        let (signal_type, base, label) = self.entry(side, price, ema_15m, rsi_15m).ok_or_else(|| {
            Veto::NoEntry(format!(
                "15m price {price:.5} vs EMA {ema_15m:.5} with RSI {rsi_15m:.1}"
            ))
        })?;
        trace.note(format!("15m {label} entry (RSI {rsi_15m:.1})"));

        let bonus = p.max_htf_bonus * extremity(rsi_4h) + p.max_ltf_bonus * extremity(rsi_15m);
        let mut confidence = (base + bonus).min(1.0);
        trace.note(format!("base {base:.2} + RSI bonus {bonus:.2}"));

        let dynamic = Level {
            name: "EMA_4H",
            price: ema_4h,
        };
        let sr = sr_context(
            side,
            price,
            ctx.pivots,
            Some(dynamic),
            ctx.zone(),
            ctx.config.sr_resistance_penalty,
            ctx.config.sr_support_bonus,
        );
        trace.note(sr.describe(side));
        confidence += sr.delta();
        let confidence = ctx.apply_floor(confidence, trace)?;

        let sl_pips = ctx.atr_stop_pips(p.min_sl_pips, p.sl_atr_mult);
        let tp_pips = self.target_pips(ctx, side, price, dynamic, sl_pips, trace);

        Ok(Setup {
            side,
            signal_type,
            confidence,
            price,
            stop: Offset::Pips(sl_pips),
            target: Offset::Pips(tp_pips),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::scorer::evaluate_scorer;
    use crate::components::scorer::testutil::*;
    use crate::domain::{CandleBundle, Direction, PivotSet};
    use chrono::Duration;

    fn bundle(h4: &[f64], m15: &[f64]) -> CandleBundle {
        let mut bundle = flat_bundle("EURUSD", 1.1000, at_hour(8));
        bundle.data_4h = series_from_closes(h4, at_hour(8), Duration::hours(4), 0.0003);
        bundle.data_15m = series_from_closes(m15, at_hour(8), Duration::minutes(15), 0.00005);
        bundle
    }

    fn uptrend() -> CandleBundle {
        bundle(
            &piecewise(1.0400, &[(119, 0.0005)]),
            &piecewise(1.0975, &[(119, 0.00002)]),
        )
    }

    fn run(bundle: &CandleBundle, pivots: &PivotSet) -> crate::domain::Signal {
        let config = EngineConfig::default();
        evaluate_scorer(&MomentumScorer::from_config(&config), bundle, pivots, &config)
    }

    #[test]
    fn momentum_buy_in_uptrend() {
        let signal = run(&uptrend(), &PivotSet::default());
        assert_eq!(signal.direction, Direction::Buy, "{}", signal.reason);
        assert_eq!(signal.signal_type, SignalType::Momentum);
        assert!((signal.confidence - 1.0).abs() < 1e-9);
        let sl = signal.recommended_sl_pips.unwrap();
        assert!(sl >= 20.0);
        assert!((signal.recommended_tp_pips.unwrap() - 1.5 * sl).abs() < 1e-9);
        assert!(signal.recommended_sl_price.unwrap() < signal.price.unwrap());
        assert!(signal.indicators.contains_key("rsi_15m"));
    }

    #[test]
    fn resistance_zone_penalizes_buy_without_bonus() {
        let bundle = uptrend();
        let price = bundle.data_15m.last_close().unwrap();
        let mut pivots = PivotSet::default();
        pivots.pivots.r1 = Some(price + 0.00001);
        pivots.pivots.s1 = Some(price - 0.00001);
        let signal = run(&bundle, &pivots);
        assert_eq!(signal.direction, Direction::Buy, "{}", signal.reason);
        assert!((signal.confidence - 0.7).abs() < 1e-9);
        assert!(signal.reason.contains("resistance penalty -0.30 at R1"), "{}", signal.reason);
        assert!(!signal.reason.contains("support bonus"));
    }

    #[test]
    fn buy_target_ignores_support_above_price() {
        let bundle = uptrend();
        let price = bundle.data_15m.last_close().unwrap();
        let mut pivots = PivotSet::default();
        pivots.pivots.s1 = Some(price + 0.0040);
        pivots.pivots.r1 = Some(price + 0.0100);
        let signal = run(&bundle, &pivots);
        assert_eq!(signal.direction, Direction::Buy, "{}", signal.reason);
        assert!(signal.reason.contains("TP at R1"), "{}", signal.reason);
        let tp = signal.recommended_tp_price.unwrap();
        assert!(tp > price + 0.0040 && tp < price + 0.0100, "tp {tp}");
    }

    #[test]
    fn momentum_sell_in_downtrend() {
        let bundle = bundle(
            &piecewise(1.1600, &[(119, -0.0005)]),
            &piecewise(1.1029, &[(119, -0.00002)]),
        );
        let signal = run(&bundle, &PivotSet::default());
        assert_eq!(signal.direction, Direction::Sell, "{}", signal.reason);
        assert!(signal.recommended_sl_price.unwrap() > signal.price.unwrap());
        assert!(signal.recommended_tp_price.unwrap() < signal.price.unwrap());
    }

    #[test]
    fn oversold_15m_is_reversion_buy() {
        let bundle = bundle(
            &piecewise(1.0400, &[(119, 0.0005)]),
            &piecewise(1.0975, &[(100, 0.00002), (19, -0.00004)]),
        );
        let signal = run(&bundle, &PivotSet::default());
        assert_eq!(signal.direction, Direction::Buy, "{}", signal.reason);
        assert_eq!(signal.signal_type, SignalType::Reversion);
        assert!(signal.reason.contains("reversion entry"));
    }

    #[test]
    fn neutral_4h_rsi_has_no_bias() {
        let bundle = bundle(
            &piecewise(1.0400, &[(99, 0.001), (20, -0.0005)]),
            &piecewise(1.0975, &[(119, 0.00002)]),
        );
        let signal = run(&bundle, &PivotSet::default());
        assert!(signal.is_flat());
        assert!(signal.reason.contains("no bias"), "{}", signal.reason);
        assert_eq!(signal.signal_type, SignalType::Momentum);
    }

    #[test]
    fn short_4h_history_is_insufficient() {
        let bundle = bundle(
            &piecewise(1.0400, &[(29, 0.0005)]),
            &piecewise(1.0975, &[(119, 0.00002)]),
        );
        let signal = run(&bundle, &PivotSet::default());
        assert!(signal.is_flat());
        assert!(signal.reason.contains("insufficient data: 4h has 30 candles, need 50"));
    }

    #[test]
    fn extremity_is_capped() {
        assert_eq!(extremity(50.0), 0.0);
        assert_eq!(extremity(95.0), 1.0);
        assert!((extremity(35.0) - 0.5).abs() < 1e-12);
    }
}
