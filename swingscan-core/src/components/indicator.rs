//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! screen only reads the value at the latest bar, but computing the full
//! series keeps every indicator checkable against look-ahead.

use crate::domain::Bar;

/// A trailing-window indicator over a bar series.
///
/// `compute` returns a series of the same length as `bars`. Positions without
/// a complete window hold `f64::NAN`.
///
/// # Look-ahead guard
/// No value at bar t may depend on bar t+1 or later. Every indicator must give
/// identical values on a truncated series and on the full series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_50", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars before the first valid value.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Value at the latest bar, NaN if undefined or the series is empty.
    fn latest(&self, bars: &[Bar]) -> f64 {
        self.compute(bars).last().copied().unwrap_or(f64::NAN)
    }
}
