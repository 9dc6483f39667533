//! Scan orchestration: universe, benchmark, then every instrument in parallel.
//!
//! Instruments are evaluated on a private rayon pool sized by
//! `ScanConfig::workers`. Each worker fetches one series and runs the pure
//! evaluation; results come back in universe order with no shared mutable
//! state beyond a completion counter for progress reporting.
//!
//! Cancellation is cooperative: the flag is checked before each instrument,
//! and instruments skipped after it is raised are reported as `Cancelled`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use swingscan_core::data::universe::dedup;
use swingscan_core::data::{DataError, DataProvider, UniverseProvider};
use swingscan_core::domain::Symbol;
use swingscan_core::{
    evaluate_with_chain, BenchmarkReturn, ConfigError, Evaluation, GateChain, Rejection,
};

use crate::aggregate::{Aggregate, ScanReport};
use crate::benchmark::fetch_benchmark;
use crate::config::ScanConfig;
use crate::progress::ScanProgress;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to fetch universe from {provider}: {source}")]
    Universe {
        provider: String,
        #[source]
        source: DataError,
    },

    #[error("universe is empty")]
    EmptyUniverse,

    #[error("benchmark {symbol} unavailable: {reason}")]
    Benchmark { symbol: String, reason: String },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What happened to one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentOutcome {
    Evaluated(Evaluation),
    /// Skipped because the scan was cancelled first.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentResult {
    pub symbol: Symbol,
    pub outcome: InstrumentOutcome,
}

impl InstrumentResult {
    pub fn evaluation(&self) -> Option<&Evaluation> {
        match &self.outcome {
            InstrumentOutcome::Evaluated(eval) => Some(eval),
            InstrumentOutcome::Cancelled => None,
        }
    }
}

/// Run a full scan.
///
/// Universe and benchmark failures abort with `ScanError`. Anything that goes
/// wrong for a single instrument becomes a rejection for that instrument only.
pub fn run_scan(
    config: &ScanConfig,
    universe: &dyn UniverseProvider,
    provider: &dyn DataProvider,
    as_of: NaiveDate,
    progress: &dyn ScanProgress,
    cancel: Option<&AtomicBool>,
) -> Result<ScanReport, ScanError> {
    config.validate()?;
    let fingerprint = config.fingerprint()?;

    let mut symbols = dedup(universe.symbols().map_err(|source| ScanError::Universe {
        provider: universe.name().to_string(),
        source,
    })?);
    symbols.truncate(config.universe_limit);
    if symbols.is_empty() {
        return Err(ScanError::EmptyUniverse);
    }
    tracing::info!(
        universe = universe.name(),
        provider = provider.name(),
        symbols = symbols.len(),
        "starting scan"
    );

    let benchmark = fetch_benchmark(config, provider, as_of)?;
    progress.on_start(symbols.len(), &config.benchmark_symbol, benchmark.value());

    let results = evaluate_symbols(config, &symbols, benchmark, provider, as_of, progress, cancel)?;

    let report = ScanReport {
        as_of,
        benchmark_symbol: config.benchmark_symbol.clone(),
        benchmark_return: benchmark.value(),
        fingerprint,
        aggregate: Aggregate::from_results(results),
    };
    tracing::info!(
        accepted = report.aggregate.counts.accepted,
        rejected = report.aggregate.counts.rejected,
        cancelled = report.aggregate.counts.cancelled,
        "scan finished"
    );
    progress.on_complete(&report);
    Ok(report)
}

/// Evaluate `symbols` against an already-known benchmark, in universe order.
pub fn evaluate_symbols(
    config: &ScanConfig,
    symbols: &[Symbol],
    benchmark: BenchmarkReturn,
    provider: &dyn DataProvider,
    as_of: NaiveDate,
    progress: &dyn ScanProgress,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<InstrumentResult>, ScanError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .thread_name(|i| format!("swingscan-worker-{i}"))
        .build()
        .map_err(|e| ScanError::WorkerPool(e.to_string()))?;

    let chain = GateChain::canonical();
    let total = symbols.len();
    let done = AtomicUsize::new(0);

    let results = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| {
                let outcome = if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                    InstrumentOutcome::Cancelled
                } else {
                    let eval = evaluate_symbol(config, symbol, benchmark, provider, as_of, &chain);
                    if let Some(record) = eval.signal() {
                        progress.on_signal(record);
                    }
                    InstrumentOutcome::Evaluated(eval)
                };
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress.on_instrument(finished, total);
                InstrumentResult {
                    symbol: symbol.clone(),
                    outcome,
                }
            })
            .collect()
    });
    Ok(results)
}

fn evaluate_symbol(
    config: &ScanConfig,
    symbol: &str,
    benchmark: BenchmarkReturn,
    provider: &dyn DataProvider,
    as_of: NaiveDate,
    chain: &GateChain,
) -> Evaluation {
    let start = as_of - Duration::days(config.history_days);
    match provider.fetch(symbol, start, as_of) {
        Ok(series) => evaluate_with_chain(&series, benchmark, &config.screen, chain),
        Err(e) => {
            tracing::debug!(symbol, error = %e, "fetch failed");
            Evaluation::Rejected(Rejection::DataUnavailable {
                reason: e.to_string(),
            })
        }
    }
}
