//! Cycle pipeline — wires scorers, aggregator and per-symbol isolation together.
//!
//! Per symbol: all scorers run in parallel on the immutable bundle, then the
//! aggregator reduces their signals (the barrier). Per batch: symbols run in
//! parallel, each under `catch_unwind`, and come back in input order. A
//! faulting symbol yields a flat signal and never affects the others.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use confluence_core::components::aggregator::CONFLUENCE;
use confluence_core::components::{default_scorers, evaluate_scorer, Aggregator, Scorer};
use confluence_core::config::{ConfigError, EngineConfig};
use confluence_core::domain::{resolve_pip_size, Signal, SignalMeta, SignalType};

use crate::input::{BatchInput, SymbolInput};
use crate::report::{CycleReport, ScorerSignals, SCHEMA_VERSION};

/// Errors from building a pipeline. They abort the run before any symbol is scored.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// One symbol's scorer signals and final decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOutcome {
    pub scorer_signals: Vec<Signal>,
    pub signal: Signal,
}

pub struct Pipeline {
    config: EngineConfig,
    config_hash: String,
    scorers: Vec<Box<dyn Scorer>>,
    aggregator: Aggregator,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.scorers.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipeline")
            .field("config_hash", &self.config_hash)
            .field("scorers", &names)
            .finish()
    }
}

impl Pipeline {
    /// Validate the config and build the enabled scorers.
    pub fn new(config: EngineConfig) -> Result<Self, RunError> {
        config.validate()?;
        let scorers = default_scorers(&config);
        Ok(Self::assemble(config, scorers))
    }

    /// A pipeline over an explicit scorer set.
    pub fn with_scorers(config: EngineConfig, scorers: Vec<Box<dyn Scorer>>) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self::assemble(config, scorers))
    }

    fn assemble(config: EngineConfig, scorers: Vec<Box<dyn Scorer>>) -> Self {
        let config_hash = config.fingerprint();
        let aggregator = Aggregator::from_config(&config);
        Self {
            config,
            config_hash,
            scorers,
            aggregator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn scorer_names(&self) -> Vec<&str> {
        self.scorers.iter().map(|s| s.name()).collect()
    }

    /// Run every scorer on one symbol, then aggregate.
    pub fn evaluate_symbol(&self, input: &SymbolInput) -> SymbolOutcome {
        let scorer_signals: Vec<Signal> = self
            .scorers
            .par_iter()
            .map(|scorer| evaluate_scorer(scorer.as_ref(), &input.bundle, &input.pivots, &self.config))
            .collect();
        let signal = self
            .aggregator
            .aggregate(input.symbol(), &scorer_signals, Some(&input.pivots));
        SymbolOutcome {
            scorer_signals,
            signal,
        }
    }

    /// `evaluate_symbol` with panics and malformed output turned into a flat signal.
    pub fn evaluate_isolated(&self, input: &SymbolInput) -> SymbolOutcome {
        let symbol = input.symbol();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate_symbol(input)));
        match outcome {
            Ok(outcome) if outcome.signal.is_well_formed() => outcome,
            Ok(outcome) => {
                warn!(symbol, "malformed final signal, emitting flat");
                SymbolOutcome {
                    signal: self.fault_signal(input, "malformed final signal"),
                    scorer_signals: outcome.scorer_signals,
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(symbol, panic = %message, "symbol evaluation panicked, emitting flat");
                SymbolOutcome {
                    signal: self.fault_signal(input, &format!("panicked: {message}")),
                    scorer_signals: Vec::new(),
                }
            }
        }
    }

    /// Score a whole batch. One final signal per input, in input order.
    pub fn evaluate_batch(&self, batch: &BatchInput, include_scorers: bool) -> CycleReport {
        let outcomes: Vec<SymbolOutcome> = batch
            .symbols
            .par_iter()
            .map(|input| self.evaluate_isolated(input))
            .collect();

        let cycle_time = batch
            .symbols
            .iter()
            .filter_map(|input| input.bundle.data_15m.latest().map(|c| c.time))
            .max();

        let scorer_signals = include_scorers.then(|| {
            batch
                .symbols
                .iter()
                .zip(&outcomes)
                .map(|(input, outcome)| ScorerSignals {
                    symbol: input.symbol().to_string(),
                    signals: outcome.scorer_signals.clone(),
                })
                .collect()
        });

        let report = CycleReport {
            schema_version: SCHEMA_VERSION,
            config_hash: self.config_hash.clone(),
            cycle_time,
            signals: outcomes.into_iter().map(|o| o.signal).collect(),
            scorer_signals,
        };
        let summary = report.summary();
        info!(
            symbols = batch.len(),
            buy = summary.buy,
            sell = summary.sell,
            flat = summary.flat,
            config_hash = %self.config_hash,
            "cycle complete"
        );
        report
    }

    fn fault_signal(&self, input: &SymbolInput, detail: &str) -> Signal {
        let symbol = input.symbol();
        let meta = SignalMeta {
            symbol: symbol.to_string(),
            pip_size: resolve_pip_size(input.bundle.meta.pip_size, symbol),
            candle_time: input.bundle.data_15m.latest().map(|c| c.time),
            scorer: CONFLUENCE.to_string(),
        };
        Signal::flat(
            symbol,
            SignalType::Confluence,
            format!("aggregation error: {detail}"),
            meta,
        )
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
