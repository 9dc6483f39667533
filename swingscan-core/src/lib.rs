//! SwingScan Core — bar series, indicators, gate chain, risk/reward, data providers.
//!
//! This crate holds everything needed to screen one instrument:
//! - Domain types (bars, bar series, signal records)
//! - Indicators computed over the full series, NaN during warmup
//! - Indicator snapshot at the latest bar
//! - The twelve-gate chain with typed failure causes
//! - Relative strength and risk/reward calculations
//! - Data providers for bars and the instrument universe
//!
//! Evaluation is pure: `evaluate_instrument` depends only on its arguments,
//! so the runner can fan instruments out across threads freely.

pub mod components;
pub mod data;
pub mod domain;
pub mod evaluate;
pub mod indicators;
pub mod params;
pub mod relative_strength;
pub mod risk;
pub mod sample;
pub mod snapshot;

pub use components::{Gate, GateCause, GateChain, GateContext, GateFailure};
pub use domain::{Bar, BarSeries, SignalRecord};
pub use evaluate::{evaluate_instrument, evaluate_with_chain, Evaluation, Rejection};
pub use params::{ConfigError, IndicatorParams, ScreenParams, Thresholds};
pub use relative_strength::{BenchmarkReturn, RelativeStrength};
pub use risk::RiskReward;
pub use snapshot::{IndicatorSnapshot, InsufficientData};
