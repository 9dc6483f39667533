//! SwingScan Runner — scan orchestration, ranking, export.
//!
//! This crate builds on `swingscan-core` to provide:
//! - Serializable scan configuration with a content fingerprint
//! - Benchmark retrieval
//! - Parallel per-instrument evaluation with cooperative cancellation
//! - Ranking, counters and rejection histogram
//! - CSV, XLSX and JSON manifest export, console progress
//! - Browsing and filtering the newest saved scan

pub mod aggregate;
pub mod benchmark;
pub mod browse;
pub mod config;
pub mod export;
pub mod progress;
pub mod scanner;

pub use aggregate::{rank_signals, Aggregate, ScanCounts, ScanReport, ScanSummary};
pub use benchmark::fetch_benchmark;
pub use browse::{load_latest_scan, SignalFilter, ValueRange};
pub use config::ScanConfig;
pub use export::{save_scan, SavedFiles, ScanManifest};
pub use progress::{NoProgress, ScanProgress, StdoutScanProgress};
pub use scanner::{evaluate_symbols, run_scan, InstrumentOutcome, InstrumentResult, ScanError};
