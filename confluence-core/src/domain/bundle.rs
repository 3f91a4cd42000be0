//! CandleBundle — one symbol's synchronized multi-timeframe input for a cycle.

use serde::{Deserialize, Serialize};

use super::candle::{CandleSeries, Timeframe};

/// Instrument metadata travelling with the bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub pip_size: Option<f64>,
}

/// Multi-timeframe candle bundle for one symbol.
///
/// Created once per poll and never mutated: every scorer borrows it immutably.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleBundle {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub data_5m: CandleSeries,
    #[serde(default)]
    pub data_15m: CandleSeries,
    #[serde(default)]
    pub data_1h: CandleSeries,
    #[serde(default)]
    pub data_4h: CandleSeries,
    #[serde(default)]
    pub data_daily: CandleSeries,
    /// Rolling history of 4-hour ATR values, used to normalize the current 4h ATR.
    #[serde(default)]
    pub hist_atr_4h: Vec<f64>,
    #[serde(default)]
    pub meta: BundleMeta,
}

impl CandleBundle {
    /// The series for a given timeframe.
    pub fn series(&self, timeframe: Timeframe) -> &CandleSeries {
        match timeframe {
            Timeframe::M5 => &self.data_5m,
            Timeframe::M15 => &self.data_15m,
            Timeframe::H1 => &self.data_1h,
            Timeframe::H4 => &self.data_4h,
            Timeframe::Daily => &self.data_daily,
        }
    }

    /// Pip size for the instrument.
    ///
    /// Uses `meta.pip_size` when it is a positive number, otherwise falls back
    /// to 0.01 for JPY- and XAU-denominated symbols and 0.0001 for the rest.
    pub fn pip_size(&self) -> f64 {
        let symbol = if self.meta.symbol.is_empty() {
            &self.symbol
        } else {
            &self.meta.symbol
        };
        resolve_pip_size(self.meta.pip_size, symbol)
    }
}

/// Resolve a pip size from an optional explicit value and the symbol name.
pub fn resolve_pip_size(explicit: Option<f64>, symbol: &str) -> f64 {
    match explicit {
        Some(pip) if pip.is_finite() && pip > 0.0 => pip,
        _ => {
            let upper = symbol.to_ascii_uppercase();
            if upper.contains("JPY") || upper.contains("XAU") {
                0.01
            } else {
                0.0001
            }
        }
    }
}
