//! Engine configuration — every threshold the scorers and aggregator use.
//!
//! All structs are `#[serde(default)]`, so a TOML file only needs the keys it
//! overrides. Defaults reproduce the archetype rule tables exactly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::ScorerKind;

/// Errors from parsing or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no scorers enabled")]
    NoScorers,
    #[error("scorer '{0}' is enabled more than once")]
    DuplicateScorer(ScorerKind),
    #[error("{field} must be >= 1")]
    ZeroPeriod { field: &'static str },
    #[error("{field} = {value} is outside [0, 1]")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("{field} = {value} must be positive")]
    NonPositive { field: &'static str, value: f64 },
    #[error("session window {start}..{end} is not a valid UTC hour range")]
    InvalidSession { start: u32, end: u32 },
    #[error("parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration shared by every scorer and the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scorers run each cycle, in this order.
    pub enabled_scorers: Vec<ScorerKind>,
    /// ATR period on every timeframe.
    pub atr_period: usize,
    /// RSI period on every timeframe.
    pub rsi_period: usize,
    /// Daily EMA period for the daily bias and the regime flag.
    pub daily_ema_period: usize,
    /// Current 15m range above this multiple of ATR(15m) vetoes the cycle.
    pub volatility_spike_multiple: f64,
    /// S/R zone half-width as a multiple of ATR(1h).
    pub sr_zone_atr_mult: f64,
    pub sr_resistance_penalty: f64,
    pub sr_support_bonus: f64,
    /// Setups below this confidence after adjustment are vetoed.
    pub min_confidence: f64,
    pub momentum: MomentumConfig,
    pub breakout_retest: BreakoutRetestConfig,
    pub mean_reversion: MeanReversionConfig,
    pub liquidity: LiquidityConfig,
    pub market_structure: MarketStructureConfig,
    pub vwap_bias: VwapBiasConfig,
    pub aggregator: AggregatorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled_scorers: ScorerKind::ALL.to_vec(),
            atr_period: 14,
            rsi_period: 14,
            daily_ema_period: 200,
            volatility_spike_multiple: 3.0,
            sr_zone_atr_mult: 0.25,
            sr_resistance_penalty: 0.3,
            sr_support_bonus: 0.2,
            min_confidence: 0.5,
            momentum: MomentumConfig::default(),
            breakout_retest: BreakoutRetestConfig::default(),
            mean_reversion: MeanReversionConfig::default(),
            liquidity: LiquidityConfig::default(),
            market_structure: MarketStructureConfig::default(),
            vwap_bias: VwapBiasConfig::default(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

/// Momentum / pullback archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub htf_ema_period: usize,
    pub ltf_ema_period: usize,
    pub htf_rsi_bull: f64,
    pub htf_rsi_bear: f64,
    pub momentum_rsi_buy: f64,
    pub momentum_rsi_sell: f64,
    pub reversion_rsi_buy: f64,
    pub reversion_rsi_sell: f64,
    pub pullback_rsi_buy: f64,
    pub pullback_rsi_sell: f64,
    pub base_momentum: f64,
    pub base_reversion: f64,
    pub base_pullback: f64,
    /// Largest bonus from 4h RSI extremity.
    pub max_htf_bonus: f64,
    /// Largest bonus from 15m RSI extremity.
    pub max_ltf_bonus: f64,
    pub min_sl_pips: f64,
    pub sl_atr_mult: f64,
    /// TP multiple of the stop when no level gives enough reward.
    pub fallback_rr: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            htf_ema_period: 50,
            ltf_ema_period: 21,
            htf_rsi_bull: 52.0,
            htf_rsi_bear: 48.0,
            momentum_rsi_buy: 55.0,
            momentum_rsi_sell: 45.0,
            reversion_rsi_buy: 35.0,
            reversion_rsi_sell: 65.0,
            pullback_rsi_buy: 40.0,
            pullback_rsi_sell: 60.0,
            base_momentum: 0.6,
            base_reversion: 0.55,
            base_pullback: 0.5,
            max_htf_bonus: 0.2,
            max_ltf_bonus: 0.2,
            min_sl_pips: 20.0,
            sl_atr_mult: 1.5,
            fallback_rr: 1.5,
        }
    }
}

/// A UTC trading window, `start_hour` inclusive to `end_hour` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SessionWindow {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// Break-and-retest archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutRetestConfig {
    pub htf_ema_period: usize,
    pub retest_zone_atr_mult: f64,
    pub rsi_buy: f64,
    pub rsi_sell: f64,
    pub session_windows: Vec<SessionWindow>,
    pub confidence: f64,
}

impl Default for BreakoutRetestConfig {
    fn default() -> Self {
        Self {
            htf_ema_period: 50,
            retest_zone_atr_mult: 0.25,
            rsi_buy: 55.0,
            rsi_sell: 45.0,
            session_windows: vec![
                SessionWindow {
                    start_hour: 7,
                    end_hour: 10,
                },
                SessionWindow {
                    start_hour: 12,
                    end_hour: 15,
                },
            ],
            confidence: 0.85,
        }
    }
}

/// Mean-reversion archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    pub adx_period: usize,
    /// ADX below this is a ranging market.
    pub adx_trend_threshold: f64,
    pub bb_period: usize,
    pub bb_std_mult: f64,
    pub stoch_rsi_period: usize,
    pub stoch_period: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub base_confidence: f64,
    pub ranging_bonus: f64,
    pub with_trend_bonus: f64,
    pub counter_trend_bonus: f64,
    pub major_sr_bonus: f64,
    pub minor_sr_bonus: f64,
    pub min_sl_pips: f64,
    pub sl_atr_mult: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            adx_period: 14,
            adx_trend_threshold: 25.0,
            bb_period: 20,
            bb_std_mult: 2.0,
            stoch_rsi_period: 14,
            stoch_period: 14,
            stoch_k: 3,
            stoch_d: 3,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            base_confidence: 0.30,
            ranging_bonus: 0.40,
            with_trend_bonus: 0.30,
            counter_trend_bonus: 0.0,
            major_sr_bonus: 0.30,
            minor_sr_bonus: 0.15,
            min_sl_pips: 20.0,
            sl_atr_mult: 1.5,
        }
    }
}

/// Liquidity (fair value gap) archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// Newest 1h candles scanned for gaps.
    pub scan_window: usize,
    pub max_distance_atr_mult: f64,
    pub stop_buffer_atr_mult: f64,
    pub reward_multiple: f64,
    pub confidence: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            scan_window: 50,
            max_distance_atr_mult: 1.0,
            stop_buffer_atr_mult: 0.25,
            reward_multiple: 2.0,
            confidence: 0.60,
        }
    }
}

/// Market structure (BOS / CHOCH) archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketStructureConfig {
    pub rsi_buy: f64,
    pub rsi_sell: f64,
    pub break_confidence: f64,
    pub fade_confidence: f64,
    pub min_sl_pips: f64,
    pub sl_atr_mult: f64,
    pub tp_sl_mult: f64,
}

impl Default for MarketStructureConfig {
    fn default() -> Self {
        Self {
            rsi_buy: 55.0,
            rsi_sell: 45.0,
            break_confidence: 0.70,
            fade_confidence: 0.65,
            min_sl_pips: 15.0,
            sl_atr_mult: 2.0,
            tp_sl_mult: 1.5,
        }
    }
}

/// VWAP bias archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VwapBiasConfig {
    /// 1h candles in the VWAP anchor window.
    pub h1_window: usize,
    /// 15m candles in the VWAP anchor window.
    pub m15_window: usize,
    pub zone_atr_mult: f64,
    pub confidence: f64,
    pub min_sl_pips: f64,
    pub sl_atr_mult: f64,
    pub tp_sl_mult: f64,
}

impl Default for VwapBiasConfig {
    fn default() -> Self {
        Self {
            h1_window: 24,
            m15_window: 32,
            zone_atr_mult: 0.25,
            confidence: 0.65,
            min_sl_pips: 15.0,
            sl_atr_mult: 1.5,
            tp_sl_mult: 1.8,
        }
    }
}

/// Confluence aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Normalized 4h ATR percentile above which volatility is High.
    pub high_volatility_percentile: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            high_volatility_percentile: 0.7,
        }
    }
}

fn check_period(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroPeriod { field });
    }
    Ok(())
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfUnitRange { field, value });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}

impl EngineConfig {
    /// Parse a (possibly partial) TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    ///
    /// Struct fields serialize in declaration order, so equal configs hash equal.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }

    /// Reject wiring that cannot produce a meaningful cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_scorers.is_empty() {
            return Err(ConfigError::NoScorers);
        }
        let mut seen = HashSet::new();
        for kind in &self.enabled_scorers {
            if !seen.insert(*kind) {
                return Err(ConfigError::DuplicateScorer(*kind));
            }
        }

        check_period("atr_period", self.atr_period)?;
        check_period("rsi_period", self.rsi_period)?;
        check_period("daily_ema_period", self.daily_ema_period)?;
        check_period("momentum.htf_ema_period", self.momentum.htf_ema_period)?;
        check_period("momentum.ltf_ema_period", self.momentum.ltf_ema_period)?;
        check_period("breakout_retest.htf_ema_period", self.breakout_retest.htf_ema_period)?;
        check_period("mean_reversion.adx_period", self.mean_reversion.adx_period)?;
        check_period("mean_reversion.bb_period", self.mean_reversion.bb_period)?;
        check_period("mean_reversion.stoch_rsi_period", self.mean_reversion.stoch_rsi_period)?;
        check_period("mean_reversion.stoch_period", self.mean_reversion.stoch_period)?;
        check_period("mean_reversion.stoch_k", self.mean_reversion.stoch_k)?;
        check_period("mean_reversion.stoch_d", self.mean_reversion.stoch_d)?;
        check_period("liquidity.scan_window", self.liquidity.scan_window)?;
        check_period("vwap_bias.h1_window", self.vwap_bias.h1_window)?;
        check_period("vwap_bias.m15_window", self.vwap_bias.m15_window)?;

        check_unit("min_confidence", self.min_confidence)?;
        check_unit(
            "aggregator.high_volatility_percentile",
            self.aggregator.high_volatility_percentile,
        )?;
        check_unit("breakout_retest.confidence", self.breakout_retest.confidence)?;
        check_unit("liquidity.confidence", self.liquidity.confidence)?;
        check_unit("market_structure.break_confidence", self.market_structure.break_confidence)?;
        check_unit("market_structure.fade_confidence", self.market_structure.fade_confidence)?;
        check_unit("vwap_bias.confidence", self.vwap_bias.confidence)?;
        check_unit("mean_reversion.base_confidence", self.mean_reversion.base_confidence)?;

        check_positive("volatility_spike_multiple", self.volatility_spike_multiple)?;
        check_positive("sr_zone_atr_mult", self.sr_zone_atr_mult)?;
        check_positive("momentum.fallback_rr", self.momentum.fallback_rr)?;
        check_positive("mean_reversion.bb_std_mult", self.mean_reversion.bb_std_mult)?;
        check_positive("liquidity.reward_multiple", self.liquidity.reward_multiple)?;
        check_positive("market_structure.tp_sl_mult", self.market_structure.tp_sl_mult)?;
        check_positive("vwap_bias.tp_sl_mult", self.vwap_bias.tp_sl_mult)?;

        for window in &self.breakout_retest.session_windows {
            if window.start_hour >= window.end_hour || window.end_hour > 24 {
                return Err(ConfigError::InvalidSession {
                    start: window.start_hour,
                    end: window.end_hour,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            min_confidence = 0.6

            [mean_reversion]
            adx_trend_threshold = 30.0
            "#,
        )
        .unwrap();
        assert_eq!(config.min_confidence, 0.6);
        assert_eq!(config.mean_reversion.adx_trend_threshold, 30.0);
        assert_eq!(config.mean_reversion.bb_period, 20);
        assert_eq!(config.volatility_spike_multiple, 3.0);
        assert_eq!(config.enabled_scorers.len(), 6);
    }

    #[test]
    fn toml_roundtrip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        let back = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn rejects_duplicate_scorers() {
        let config = EngineConfig {
            enabled_scorers: vec![ScorerKind::Momentum, ScorerKind::Momentum],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateScorer(ScorerKind::Momentum))
        ));
    }

    #[test]
    fn rejects_empty_scorer_list() {
        let err = EngineConfig::from_toml_str("enabled_scorers = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoScorers));
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.min_confidence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { .. })
        ));

        let mut config = EngineConfig::default();
        config.mean_reversion.bb_period = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPeriod { .. })));

        let mut config = EngineConfig::default();
        config.breakout_retest.session_windows = vec![SessionWindow {
            start_hour: 15,
            end_hour: 12,
        }];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSession { .. })
        ));
    }

    #[test]
    fn fingerprint_tracks_thresholds() {
        let base = EngineConfig::default();
        assert_eq!(base.fingerprint(), EngineConfig::default().fingerprint());
        assert_eq!(base.fingerprint().len(), 64);

        let mut tweaked = EngineConfig::default();
        tweaked.sr_support_bonus = 0.25;
        assert_ne!(base.fingerprint(), tweaked.fingerprint());
    }

    #[test]
    fn session_window_bounds() {
        let window = SessionWindow {
            start_hour: 7,
            end_hour: 10,
        };
        assert!(window.contains(7));
        assert!(window.contains(9));
        assert!(!window.contains(10));
        assert!(!window.contains(18));
    }
}
