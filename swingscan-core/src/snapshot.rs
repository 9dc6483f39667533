//! Indicator snapshot: every indicator the gate chain reads, at the latest bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::indicator::Indicator;
use crate::domain::BarSeries;
use crate::indicators::{AverageVolume, Extreme, RollingExtreme, Rsi, Sma};
use crate::params::IndicatorParams;

/// The series is too short to say anything about the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("insufficient history: {bars} bars, {required} required")]
pub struct InsufficientData {
    pub bars: usize,
    pub required: usize,
}

/// Point-in-time indicator values for one instrument.
///
/// Undefined values are `f64::NAN`. The snapshot never rejects on its own
/// beyond the minimum-history check; gates decide what NaN means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Date of the latest bar.
    pub as_of: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub rsi: f64,
    pub range_high: f64,
    pub range_low: f64,
    /// 52-period high (NaN until `high_min_periods` bars exist).
    pub period_high: f64,
    pub avg_volume: f64,
    pub bar_count: usize,
}

impl IndicatorSnapshot {
    pub fn compute(series: &BarSeries, params: &IndicatorParams) -> Result<Self, InsufficientData> {
        let bars = series.bars();
        let latest = match series.latest() {
            Some(bar) if bars.len() >= params.min_bars => bar,
            _ => {
                return Err(InsufficientData {
                    bars: bars.len(),
                    required: params.min_bars,
                })
            }
        };

        Ok(Self {
            as_of: latest.date,
            close: latest.close,
            volume: latest.volume as f64,
            sma_fast: Sma::new(params.fast_sma).latest(bars),
            sma_slow: Sma::new(params.slow_sma).latest(bars),
            rsi: Rsi::new(params.rsi_period).latest(bars),
            range_high: RollingExtreme::highest(params.range_window).latest(bars),
            range_low: RollingExtreme::lowest(params.range_window).latest(bars),
            period_high: RollingExtreme::with_min_periods(
                Extreme::Highest,
                params.high_window,
                params.high_min_periods,
            )
            .latest(bars),
            avg_volume: AverageVolume::new(params.volume_window).latest(bars),
            bar_count: bars.len(),
        })
    }

    /// Width of the recent high/low range.
    pub fn range(&self) -> f64 {
        self.range_high - self.range_low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    #[test]
    fn short_series_is_insufficient() {
        let series = sample::trending_series("SHORT", 199);
        let err = IndicatorSnapshot::compute(&series, &IndicatorParams::default()).unwrap_err();
        assert_eq!(
            err,
            InsufficientData {
                bars: 199,
                required: 200
            }
        );
    }

    #[test]
    fn empty_series_is_insufficient() {
        let series = BarSeries::new("EMPTY", Vec::new()).unwrap();
        assert!(IndicatorSnapshot::compute(&series, &IndicatorParams::default()).is_err());
    }

    #[test]
    fn snapshot_reads_latest_values() {
        let series = sample::swing_setup("SETUP");
        let snap = IndicatorSnapshot::compute(&series, &IndicatorParams::default()).unwrap();

        assert_eq!(snap.bar_count, series.len());
        assert_eq!(snap.close, 100.0);
        assert!((snap.range_high - 100.1).abs() < 1e-9);
        assert!((snap.range_low - 97.4).abs() < 1e-9);
        assert!((snap.period_high - 100.1).abs() < 1e-9);
        assert!(snap.sma_fast < snap.close);
        assert!(snap.sma_slow * 1.02 < snap.close);
        assert!(snap.rsi > 50.0 && snap.rsi < 70.0, "rsi = {}", snap.rsi);
        assert_eq!(snap.avg_volume, snap.volume);
    }

    #[test]
    fn period_high_needs_min_periods() {
        let series = sample::trending_series("YOUNG", 210);
        let params = IndicatorParams {
            min_bars: 100,
            high_min_periods: 220,
            high_window: 252,
            ..IndicatorParams::default()
        };
        let snap = IndicatorSnapshot::compute(&series, &params).unwrap();
        assert!(snap.period_high.is_nan());
        assert!(!snap.sma_slow.is_nan());
    }
}
