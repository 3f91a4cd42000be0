//! Confluence Runner — cycle orchestration on top of `confluence-core`.
//!
//! This crate provides:
//! - TOML configuration loading with defaults and validation
//! - Batch input loading (one candle bundle and pivot set per symbol)
//! - The cycle pipeline: parallel scorers, aggregation barrier, per-symbol isolation
//! - Cycle reports stamped with the configuration fingerprint

pub mod config;
pub mod input;
pub mod pipeline;
pub mod report;

pub use config::{load_config, load_config_or_default, ConfigFileError};
pub use input::{load_batch, BatchInput, InputError, SymbolInput};
pub use pipeline::{Pipeline, RunError, SymbolOutcome};
pub use report::{CycleReport, CycleSummary, ScorerSignals, SCHEMA_VERSION};
