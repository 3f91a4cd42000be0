//! Support/resistance context shared by the scorers.
//!
//! Levels come from the pivot set plus an optional dynamic level (a
//! higher-timeframe EMA). Each level carries a zone of `ATR(1h) * mult`
//! on either side; price "is at" a level when it sits inside that zone.

use crate::domain::{Level, PivotSet, Side};

/// Outcome of the S/R context check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SrContext {
    /// Price sits in an adverse level's zone (resistance for a buy).
    Against { level: Level, penalty: f64 },
    /// Price sits in a favorable level's zone (support for a buy).
    Favorable { level: Level, bonus: f64 },
    Clear,
}

impl SrContext {
    /// Signed confidence delta.
    pub fn delta(&self) -> f64 {
        match self {
            SrContext::Against { penalty, .. } => -penalty,
            SrContext::Favorable { bonus, .. } => *bonus,
            SrContext::Clear => 0.0,
        }
    }

    /// Trace annotation for the decision path.
    pub fn describe(&self, side: Side) -> String {
        let (adverse, favorable) = match side {
            Side::Buy => ("resistance", "support"),
            Side::Sell => ("support", "resistance"),
        };
        match self {
            SrContext::Against { level, penalty } => {
                format!("S/R: {adverse} penalty -{penalty:.2} at {}", level.name)
            }
            SrContext::Favorable { level, bonus } => {
                format!("S/R: {favorable} bonus +{bonus:.2} at {}", level.name)
            }
            SrContext::Clear => "S/R: clear".to_string(),
        }
    }
}

pub fn in_zone(price: f64, level: f64, zone: f64) -> bool {
    (price - level).abs() <= zone
}

/// Adverse and favorable level lists for a trade direction.
///
/// For a buy the adverse side is R1-R3 and PDH; the favorable side is S1-S3,
/// PDL, P and the dynamic level. A sell mirrors it, with P and the dynamic
/// level moving to the favorable (overhead) side.
pub fn sides(side: Side, pivots: &PivotSet, dynamic: Option<Level>) -> (Vec<Level>, Vec<Level>) {
    let (mut against, mut favorable) = match side {
        Side::Buy => (pivots.resistance_levels(), pivots.support_levels()),
        Side::Sell => (pivots.support_levels(), pivots.resistance_levels()),
    };
    favorable.extend(pivots.pivot());
    favorable.extend(dynamic.filter(|l| l.price.is_finite()));
    against.retain(|l| l.price.is_finite());
    (against, favorable)
}

/// First adverse level in zone wins and suppresses any bonus; otherwise the
/// first favorable level in zone applies its bonus. Matches never stack.
pub fn sr_context(
    side: Side,
    price: f64,
    pivots: &PivotSet,
    dynamic: Option<Level>,
    zone: f64,
    penalty: f64,
    bonus: f64,
) -> SrContext {
    let (against, favorable) = sides(side, pivots, dynamic);
    if let Some(level) = against.into_iter().find(|l| in_zone(price, l.price, zone)) {
        return SrContext::Against { level, penalty };
    }
    if let Some(level) = favorable.into_iter().find(|l| in_zone(price, l.price, zone)) {
        return SrContext::Favorable { level, bonus };
    }
    SrContext::Clear
}

/// Tiered bonus for reversal entries at support (buy) or resistance (sell).
///
/// Major levels are S2, S3 and PDL (R2, R3 and PDH for a sell); minor levels
/// are S1 and P (R1 and P). Major levels are checked first.
pub fn tiered_bonus(
    side: Side,
    price: f64,
    pivots: &PivotSet,
    zone: f64,
    major: f64,
    minor: f64,
) -> Option<(Level, f64)> {
    let p = &pivots.pivots;
    let named = |name: &'static str, price: Option<f64>| {
        price
            .filter(|v| v.is_finite())
            .map(|price| Level { name, price })
    };
    let (major_levels, minor_levels) = match side {
        Side::Buy => (
            [named("S2", p.s2), named("S3", p.s3), named("PDL", pivots.pdl)],
            [named("S1", p.s1), named("P", p.p)],
        ),
        Side::Sell => (
            [named("R2", p.r2), named("R3", p.r3), named("PDH", pivots.pdh)],
            [named("R1", p.r1), named("P", p.p)],
        ),
    };
    let hit = |levels: &[Option<Level>]| {
        levels
            .iter()
            .flatten()
            .copied()
            .find(|l| in_zone(price, l.price, zone))
    };
    hit(&major_levels[..])
        .map(|l| (l, major))
        .or_else(|| hit(&minor_levels[..]).map(|l| (l, minor)))
}

/// Take-profit candidates: resistance levels for a buy, support levels for a
/// sell, plus P and the dynamic level on either side.
pub fn target_levels(side: Side, pivots: &PivotSet, dynamic: Option<Level>) -> Vec<Level> {
    let mut levels = match side {
        Side::Buy => pivots.resistance_levels(),
        Side::Sell => pivots.support_levels(),
    };
    levels.extend(pivots.pivot());
    levels.extend(dynamic.filter(|l| l.price.is_finite()));
    levels
}

/// Nearest level strictly beyond `price` in the trade direction.
pub fn nearest_beyond(side: Side, price: f64, levels: &[Level]) -> Option<Level> {
    levels
        .iter()
        .copied()
        .filter(|l| l.price.is_finite())
        .filter(|l| match side {
            Side::Buy => l.price > price,
            Side::Sell => l.price < price,
        })
        .min_by(|a, b| (a.price - price).abs().total_cmp(&(b.price - price).abs()))
}
