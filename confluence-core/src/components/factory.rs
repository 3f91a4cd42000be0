//! Factory system — converts the engine configuration into runtime scorers.
//!
//! `create_scorer` builds one scorer from its kind and `default_scorers` builds
//! the enabled set in configured order.

use crate::config::EngineConfig;
use crate::domain::ScorerKind;

use super::scorer::{
    BreakoutRetestScorer, LiquidityScorer, MarketStructureScorer, MeanReversionScorer,
    MomentumScorer, Scorer, VwapBiasScorer,
};

// ─── Scorer factory ──────────────────────────────────────────────────

/// Create one scorer, parameterized from `config`.
pub fn create_scorer(kind: ScorerKind, config: &EngineConfig) -> Box<dyn Scorer> {
    match kind {
        ScorerKind::Momentum => Box::new(MomentumScorer::from_config(config)),
        ScorerKind::BreakoutRetest => Box::new(BreakoutRetestScorer::from_config(config)),
        ScorerKind::MeanReversion => Box::new(MeanReversionScorer::from_config(config)),
        ScorerKind::Liquidity => Box::new(LiquidityScorer::from_config(config)),
        ScorerKind::MarketStructure => Box::new(MarketStructureScorer::from_config(config)),
        ScorerKind::VwapBias => Box::new(VwapBiasScorer::from_config(config)),
    }
}

/// The enabled scorers, in the order they appear in `enabled_scorers`.
pub fn default_scorers(config: &EngineConfig) -> Vec<Box<dyn Scorer>> {
    config
        .enabled_scorers
        .iter()
        .map(|&kind| create_scorer(kind, config))
        .collect()
}
