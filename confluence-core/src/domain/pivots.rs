//! PivotSet — prior-day pivot levels supplied by the upstream collaborator.

use serde::{Deserialize, Serialize};

/// Classic floor-pivot levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    #[serde(default)]
    pub p: Option<f64>,
    #[serde(default)]
    pub s1: Option<f64>,
    #[serde(default)]
    pub s2: Option<f64>,
    #[serde(default)]
    pub s3: Option<f64>,
    #[serde(default)]
    pub r1: Option<f64>,
    #[serde(default)]
    pub r2: Option<f64>,
    #[serde(default)]
    pub r3: Option<f64>,
}

/// Pivot levels plus the previous day's high, low and close.
///
/// Read-only input; any level may be missing and every consumer filters
/// missing levels out before scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotSet {
    #[serde(default)]
    pub pivots: PivotLevels,
    #[serde(default)]
    pub pdh: Option<f64>,
    #[serde(default)]
    pub pdl: Option<f64>,
    #[serde(default)]
    pub pdc: Option<f64>,
}

/// A named price level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub name: &'static str,
    pub price: f64,
}

fn collect(levels: &[(&'static str, Option<f64>)]) -> Vec<Level> {
    levels
        .iter()
        .filter_map(|&(name, price)| match price {
            Some(p) if p.is_finite() => Some(Level { name, price: p }),
            _ => None,
        })
        .collect()
}

impl PivotSet {
    /// Resistance-side levels: R1, R2, R3, PDH.
    pub fn resistance_levels(&self) -> Vec<Level> {
        collect(&[
            ("R1", self.pivots.r1),
            ("R2", self.pivots.r2),
            ("R3", self.pivots.r3),
            ("PDH", self.pdh),
        ])
    }

    /// Support-side levels: S1, S2, S3, PDL.
    pub fn support_levels(&self) -> Vec<Level> {
        collect(&[
            ("S1", self.pivots.s1),
            ("S2", self.pivots.s2),
            ("S3", self.pivots.s3),
            ("PDL", self.pdl),
        ])
    }

    /// The central pivot, if present.
    pub fn pivot(&self) -> Option<Level> {
        collect(&[("P", self.pivots.p)]).into_iter().next()
    }

    /// Every present level, including P.
    pub fn all_levels(&self) -> Vec<Level> {
        let mut levels = self.pivot().into_iter().collect::<Vec<_>>();
        levels.extend(self.resistance_levels());
        levels.extend(self.support_levels());
        levels
    }

    /// True if both previous-day extremes are present.
    pub fn has_prior_day_range(&self) -> bool {
        matches!((self.pdh, self.pdl), (Some(h), Some(l)) if h.is_finite() && l.is_finite())
    }
}
