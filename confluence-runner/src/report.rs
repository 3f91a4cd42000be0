//! Cycle report — the serialized output of one evaluation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use confluence_core::domain::{Direction, Signal};

/// Current schema version for serialized reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-scorer signals for one symbol, kept for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerSignals {
    pub symbol: String,
    pub signals: Vec<Signal>,
}

/// Counts of final decisions in a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub buy: usize,
    pub sell: usize,
    pub flat: usize,
}

/// All final signals of one cycle, stamped with the config fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 fingerprint of the engine configuration.
    pub config_hash: String,
    /// Newest 15m candle time across all inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_time: Option<DateTime<Utc>>,
    /// One final signal per input symbol, in input order.
    pub signals: Vec<Signal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer_signals: Option<Vec<ScorerSignals>>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary {
        self.signals
            .iter()
            .fold(CycleSummary::default(), |mut acc, s| {
                match s.direction {
                    Direction::Buy => acc.buy += 1,
                    Direction::Sell => acc.sell += 1,
                    Direction::Flat => acc.flat += 1,
                }
                acc
            })
    }

    /// The final signal for `symbol`, if it was in the batch.
    pub fn signal_for(&self, symbol: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.symbol == symbol)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
