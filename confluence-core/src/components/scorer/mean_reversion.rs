//! Mean-reversion scorer.
//!
//! Regime from 4h ADX: below the trend threshold is ranging, otherwise
//! trending in the direction of the dominant DI. Entry on 15m: close outside
//! the Bollinger Band with Stochastic RSI %K stretched the same way (below
//! the lower band with %K < 20 buys, above the upper band with %K > 80 sells).
//!
//! Confidence = base + regime bonus (ranging, with the trend, or fading it)
//! + tiered S/R bonus for entries at major or minor levels. Target is the
//! middle band.

use crate::config::{EngineConfig, MeanReversionConfig};
use crate::components::indicator::Indicator;
use crate::domain::{ScorerKind, Side, SignalType, Timeframe};
use crate::indicators::{Adx, AdxReading, Bollinger, StochRsi};

use super::levels::tiered_bonus;
use super::{Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};

/// Market regime read from 4h ADX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxRegime {
    Ranging,
    Trending(Side),
}

#[derive(Debug, Clone)]
pub struct MeanReversionScorer {
    params: MeanReversionConfig,
}

impl MeanReversionScorer {
    pub fn new(params: MeanReversionConfig) -> Self {
        Self { params }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.mean_reversion.clone())
    }

    pub fn classify(&self, reading: &AdxReading) -> AdxRegime {
        if reading.adx < self.params.adx_trend_threshold {
            AdxRegime::Ranging
        } else if reading.plus_di >= reading.minus_di {
            AdxRegime::Trending(Side::Buy)
        } else {
            AdxRegime::Trending(Side::Sell)
        }
    }

    /// Base confidence plus the regime bonus for a trade on `side`.
    pub fn regime_confidence(&self, regime: AdxRegime, side: Side) -> (f64, &'static str) {
        let p = &self.params;
        let (bonus, label) = match regime {
            AdxRegime::Ranging => (p.ranging_bonus, "ranging"),
            AdxRegime::Trending(trend) if trend == side => (p.with_trend_bonus, "pullback with trend"),
            AdxRegime::Trending(_) => (p.counter_trend_bonus, "fading trend"),
        };
        (p.base_confidence + bonus, label)
    }

    fn stoch(&self) -> StochRsi {
        let p = &self.params;
        StochRsi::new(p.stoch_rsi_period, p.stoch_period, p.stoch_k, p.stoch_d)
    }
}

impl Scorer for MeanReversionScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::MeanReversion
    }

    fn requirements(&self) -> Vec<Requirement> {
        let p = &self.params;
        vec![
            Requirement::new(Timeframe::H4, Adx::new(p.adx_period).lookback() + 1),
            Requirement::new(
                Timeframe::M15,
                p.bb_period.max(self.stoch().lookback() + 1),
            ),
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, trace: &mut Trace) -> Result<Setup, Veto> {
        let p = &self.params;
        let reading = Adx::new(p.adx_period)
            .latest_reading(&ctx.bundle.data_4h)
            .ok_or(Veto::IndicatorUnavailable("adx_4h"))?;
        trace.record("adx_4h", reading.adx);
        trace.record("plus_di_4h", reading.plus_di);
        trace.record("minus_di_4h", reading.minus_di);
        let regime = self.classify(&reading);

        let m15 = &ctx.bundle.data_15m;
        let bands = Bollinger::new(p.bb_period, p.bb_std_mult)
            .latest_bands(m15)
            .ok_or(Veto::IndicatorUnavailable("bollinger_15m"))?;
        let stoch = self
            .stoch()
            .latest_reading(m15)
            .ok_or(Veto::IndicatorUnavailable("stoch_rsi_15m"))?;
        let price = ctx.price_15m;
        trace.record("bb_upper", bands.upper);
        trace.record("bb_middle", bands.middle);
        trace.record("bb_lower", bands.lower);
        trace.record("stoch_k", stoch.k);
        trace.record("stoch_d", stoch.d);
        trace.record("price", price);

        let side = if price < bands.lower && stoch.k < p.stoch_oversold {
            Side::Buy
        } else if price > bands.upper && stoch.k > p.stoch_overbought {
            Side::Sell
        } else {
            return Err(Veto::NoEntry(format!(
                "price {price:.5} inside bands {:.5}..{:.5} or %K {:.1} not stretched",
                bands.lower, bands.upper, stoch.k
            )));
        };
        trace.note(format!(
            "15m {side} entry: outside band with %K {:.1} (ADX {:.1})",
            stoch.k, reading.adx
        ));

        let (mut confidence, label) = self.regime_confidence(regime, side);
        trace.note(format!("{label}: {confidence:.2}"));
        if let Some((level, bonus)) =
            tiered_bonus(side, price, ctx.pivots, ctx.zone(), p.major_sr_bonus, p.minor_sr_bonus)
        {
            confidence += bonus;
            trace.note(format!("S/R bonus +{bonus:.2} at {}", level.name));
        }
        let confidence = ctx.apply_floor(confidence.min(1.0), trace)?;

        let sl_pips = ctx.atr_stop_pips(p.min_sl_pips, p.sl_atr_mult);
        if (bands.middle - price) * side.sign() <= 0.0 {
            return Err(Veto::NoTarget("middle band not beyond price".into()));
        }
        trace.note("TP at middle band");

        Ok(Setup {
            side,
            signal_type: SignalType::Reversion,
            confidence,
            price,
            stop: Offset::Pips(sl_pips),
            target: Offset::Price(bands.middle),
        })
    }
}
