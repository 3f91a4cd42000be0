//! Confluence Core — stateless multi-timeframe trading signal engine.
//!
//! This crate contains the decision logic of the signal service:
//! - Domain types (candles, timeframe bundles, pivots, signals)
//! - Indicator library (RSI, ATR, EMA, Bollinger, ADX, StochRSI, VWAP, FVG)
//! - Six strategy scorers behind the `Scorer` trait
//! - Confluence aggregator with regime classification
//! - Engine configuration with validation and fingerprinting
//!
//! Everything here is a pure function of its inputs; no I/O, no clock.

pub mod components;
pub mod config;
pub mod domain;
pub mod indicators;
