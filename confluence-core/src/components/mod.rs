//! Component traits — the evaluation pipeline in three stages.
//!
//! - Indicator: pure numeric series over candles
//! - Scorer: one strategy archetype, gated and traced, emitting one signal
//! - Aggregator: regime classification and selection over all scorer signals
//!
//! Plus the factory that turns an `EngineConfig` into scorer trait objects.

pub mod aggregator;
pub mod factory;
pub mod indicator;
pub mod scorer;

pub use aggregator::{AggregationError, Aggregator, Regime, Trend, Volatility};
pub use factory::{create_scorer, default_scorers};
pub use indicator::Indicator;
pub use scorer::{evaluate_scorer, Offset, Requirement, Scorer, ScoringContext, Setup, Trace, Veto};
