//! Fair Value Gap (FVG) detector.
//!
//! Scans consecutive 3-candle windows (oldest, middle, newest):
//! - Bullish gap: oldest.high < newest.low, spanning [oldest.high, newest.low]
//! - Bearish gap: oldest.low > newest.high, spanning [newest.high, oldest.low]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapKind {
    Bullish,
    Bearish,
}

/// A detected price imbalance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub kind: GapKind,
    pub top: f64,
    pub bottom: f64,
    /// Index (in the scanned chronological slice) of the newest candle of the triple.
    pub index: usize,
    /// Time of the newest candle of the triple.
    pub time: DateTime<Utc>,
}

impl FairValueGap {
    /// Distance from `price` to the gap; zero when price is inside it.
    pub fn distance_to(&self, price: f64) -> f64 {
        if price > self.top {
            price - self.top
        } else if price < self.bottom {
            self.bottom - price
        } else {
            0.0
        }
    }

    /// True once a later candle has traded through the far edge of the gap.
    ///
    /// `candles` is the same chronological slice the gap was detected in.
    pub fn is_filled(&self, candles: &[Candle]) -> bool {
        let later = candles.get(self.index + 1..).unwrap_or(&[]);
        match self.kind {
            GapKind::Bullish => later.iter().any(|c| c.low <= self.bottom),
            GapKind::Bearish => later.iter().any(|c| c.high >= self.top),
        }
    }
}

/// Detect every gap in a chronological slice, oldest first.
pub fn detect_fvgs(candles: &[Candle]) -> Vec<FairValueGap> {
    candles
        .windows(3)
        .enumerate()
        .filter_map(|(i, w)| {
            let (oldest, newest) = (&w[0], &w[2]);
            let index = i + 2;
            if oldest.high < newest.low {
                Some(FairValueGap {
                    kind: GapKind::Bullish,
                    top: newest.low,
                    bottom: oldest.high,
                    index,
                    time: newest.time,
                })
            } else if oldest.low > newest.high {
                Some(FairValueGap {
                    kind: GapKind::Bearish,
                    top: oldest.low,
                    bottom: newest.high,
                    index,
                    time: newest.time,
                })
            } else {
                None
            }
        })
        .collect()
}
