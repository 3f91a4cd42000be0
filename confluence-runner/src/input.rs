//! Batch input: one candle bundle and pivot set per symbol.
//!
//! Accepts either `{ "symbols": [ ... ] }` or a bare array of symbol inputs.

use std::io;
use std::path::{Path, PathBuf};

use confluence_core::domain::{CandleBundle, PivotSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading batch input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed input JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input #{index} has no symbol")]
    MissingSymbol { index: usize },
}

/// Everything one symbol's cycle needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInput {
    pub bundle: CandleBundle,
    #[serde(default)]
    pub pivots: PivotSet,
}

impl SymbolInput {
    /// Copies `meta.symbol` into an empty `bundle.symbol`.
    pub fn new(mut bundle: CandleBundle, pivots: PivotSet) -> Self {
        if bundle.symbol.is_empty() {
            bundle.symbol = bundle.meta.symbol.clone();
        }
        Self { bundle, pivots }
    }

    /// The bundle's symbol, falling back to `meta.symbol`.
    pub fn symbol(&self) -> &str {
        if self.bundle.symbol.is_empty() {
            &self.bundle.meta.symbol
        } else {
            &self.bundle.symbol
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchInput {
    pub symbols: Vec<SymbolInput>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchShape {
    Wrapped { symbols: Vec<SymbolInput> },
    Bare(Vec<SymbolInput>),
}

impl BatchInput {
    pub fn new(symbols: Vec<SymbolInput>) -> Self {
        Self { symbols }
    }

    /// Parse a batch and normalize every bundle's symbol.
    pub fn from_json_str(json: &str) -> Result<Self, InputError> {
        let symbols = match serde_json::from_str::<BatchShape>(json)? {
            BatchShape::Wrapped { symbols } | BatchShape::Bare(symbols) => symbols,
        };
        let mut batch = Self { symbols };
        batch.normalize()?;
        Ok(batch)
    }

    /// Copy `meta.symbol` into an empty `bundle.symbol`; reject inputs with neither.
    fn normalize(&mut self) -> Result<(), InputError> {
        for (index, input) in self.symbols.iter_mut().enumerate() {
            let symbol = input.symbol().to_string();
            if symbol.is_empty() {
                return Err(InputError::MissingSymbol { index });
            }
            input.bundle.symbol = symbol;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Read and parse a batch input file.
pub fn load_batch(path: &Path) -> Result<BatchInput, InputError> {
    let json = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    BatchInput::from_json_str(&json)
}
