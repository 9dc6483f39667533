//! Relative strength against a benchmark index.
//!
//! Pass condition: `stock_return > benchmark_return * margin`, taken literally.
//! For a negative benchmark return the multiplier lowers the bar instead of
//! raising it (a -10% benchmark with margin 1.10 requires only > -11%).

use serde::{Deserialize, Serialize};

use crate::domain::BarSeries;

/// Trailing fractional return of the benchmark, shared by every evaluation in a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReturn(f64);

impl BenchmarkReturn {
    /// Wrap a fractional return. Non-finite values are refused.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    /// Trailing return of a benchmark series over `lookback` bars.
    pub fn from_series(series: &BarSeries, lookback: usize) -> Option<Self> {
        trailing_return(series, lookback).and_then(Self::new)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// `latest_close / close_back(lookback) - 1`, `None` if the base is missing or not positive.
pub fn trailing_return(series: &BarSeries, lookback: usize) -> Option<f64> {
    let base = series.close_back(lookback)?;
    let latest = series.close_back(1)?;
    if base.is_nan() || base <= 0.0 || !latest.is_finite() {
        return None;
    }
    let ret = latest / base - 1.0;
    ret.is_finite().then_some(ret)
}

/// Outcome of one relative-strength comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeStrength {
    pub stock_return: f64,
    pub benchmark_return: f64,
    pub passed: bool,
}

impl RelativeStrength {
    pub fn evaluate(stock_return: f64, benchmark: BenchmarkReturn, margin: f64) -> Self {
        let benchmark_return = benchmark.value();
        Self {
            stock_return,
            benchmark_return,
            passed: stock_return > benchmark_return * margin,
        }
    }

    /// Return spread over the benchmark, in percent.
    pub fn spread_pct(&self) -> f64 {
        (self.stock_return - self.benchmark_return) * 100.0
    }
}
