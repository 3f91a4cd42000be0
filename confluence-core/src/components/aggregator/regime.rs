//! Regime classification from the indicator snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::RegimeSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    /// Daily EMA flag unavailable.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regime {
    pub trend: Trend,
    pub volatility: Volatility,
}

impl Regime {
    /// Up when the daily close is above its EMA, Down when below, Neutral
    /// when unknown. High volatility when the 4h ATR percentile exceeds
    /// `high_percentile`.
    pub fn classify(snapshot: &RegimeSnapshot, high_percentile: f64) -> Self {
        let trend = match snapshot.daily_above_ema200 {
            Some(true) => Trend::Up,
            Some(false) => Trend::Down,
            None => Trend::Neutral,
        };
        let volatility = if snapshot.atr_4h_percentile > high_percentile {
            Volatility::High
        } else {
            Volatility::Low
        };
        Self { trend, volatility }
    }

    /// Neutral trend in a high-volatility market: no trade at all.
    pub fn is_volatile_chop(&self) -> bool {
        self.trend == Trend::Neutral && self.volatility == Volatility::High
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Neutral => "neutral",
        })
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Volatility::High => "high",
            Volatility::Low => "low",
        })
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trend {} / volatility {}", self.trend, self.volatility)
    }
}
