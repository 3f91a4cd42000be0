//! Domain types for the signal core.

pub mod bundle;
pub mod candle;
pub mod pivots;
pub mod signal;

pub use bundle::{resolve_pip_size, BundleMeta, CandleBundle};
pub use candle::{Candle, CandleSeries, Timeframe};
pub use pivots::{Level, PivotLevels, PivotSet};
pub use signal::{
    clamp_confidence, Direction, RegimeSnapshot, ScorerKind, Side, Signal, SignalMeta, SignalType,
};
