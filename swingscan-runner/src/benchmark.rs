//! Benchmark index return shared by every instrument in a scan.

use chrono::{Duration, NaiveDate};
use swingscan_core::data::DataProvider;
use swingscan_core::relative_strength::trailing_return;
use swingscan_core::BenchmarkReturn;

use crate::config::ScanConfig;
use crate::scanner::ScanError;

/// Fetch the benchmark series and compute its trailing return.
///
/// A benchmark that cannot be fetched or is too short for the lookback is a
/// hard error: scanning against a made-up benchmark would silently change
/// which instruments pass the relative-strength gate.
pub fn fetch_benchmark(
    config: &ScanConfig,
    provider: &dyn DataProvider,
    as_of: NaiveDate,
) -> Result<BenchmarkReturn, ScanError> {
    let symbol = config.benchmark_symbol.as_str();
    let start = as_of - Duration::days(config.benchmark_history_days);
    let lookback = config.screen.indicators.relative_strength_lookback;

    let series = provider
        .fetch(symbol, start, as_of)
        .map_err(|e| ScanError::Benchmark {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

    let ret = trailing_return(&series, lookback)
        .and_then(BenchmarkReturn::new)
        .ok_or_else(|| ScanError::Benchmark {
            symbol: symbol.to_string(),
            reason: format!("no usable {lookback}-bar return in {} bars", series.len()),
        })?;

    tracing::info!(
        symbol,
        bars = series.len(),
        return_pct = ret.value() * 100.0,
        "benchmark loaded"
    );
    Ok(ret)
}
