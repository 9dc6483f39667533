//! Rolling extremes: highest high / lowest low over a trailing window.
//!
//! Like a Donchian band, but with a `min_periods` floor: a partially filled
//! window still yields a value once it holds at least `min_periods` bars.
//! The 52-period high uses a 252-bar window with a 200-bar floor.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which extreme to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    /// max(high) over the window.
    Highest,
    /// min(low) over the window.
    Lowest,
}

#[derive(Debug, Clone)]
pub struct RollingExtreme {
    window: usize,
    min_periods: usize,
    extreme: Extreme,
    name: String,
}

impl RollingExtreme {
    pub fn highest(window: usize) -> Self {
        Self::with_min_periods(Extreme::Highest, window, window)
    }

    pub fn lowest(window: usize) -> Self {
        Self::with_min_periods(Extreme::Lowest, window, window)
    }

    pub fn with_min_periods(extreme: Extreme, window: usize, min_periods: usize) -> Self {
        assert!(window >= 1, "rolling window must be >= 1");
        assert!(
            (1..=window).contains(&min_periods),
            "min_periods must be in 1..=window"
        );
        let prefix = match extreme {
            Extreme::Highest => "highest",
            Extreme::Lowest => "lowest",
        };
        Self {
            window,
            min_periods,
            extreme,
            name: format!("{prefix}_{window}"),
        }
    }
}

impl Indicator for RollingExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.min_periods - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];

        for (i, slot) in result.iter_mut().enumerate() {
            let start = (i + 1).saturating_sub(self.window);
            if i + 1 - start < self.min_periods {
                continue;
            }
            let window = &bars[start..=i];
            *slot = match self.extreme {
                Extreme::Highest => fold_extreme(window.iter().map(|b| b.high), f64::max),
                Extreme::Lowest => fold_extreme(window.iter().map(|b| b.low), f64::min),
            };
        }

        result
    }
}

/// Fold with NaN propagation (f64::max/min alone would skip NaN).
fn fold_extreme(values: impl Iterator<Item = f64>, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc: Option<f64> = None;
    for v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        acc = Some(acc.map_or(v, |a| pick(a, v)));
    }
    acc.unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn highest_and_lowest_over_window() {
        // make_bars: high = max(open, close) + 1, low = min(open, close) - 1
        let bars = make_bars(&[10.0, 12.0, 11.0, 15.0, 13.0]);
        let hi = RollingExtreme::highest(3).compute(&bars);
        let lo = RollingExtreme::lowest(3).compute(&bars);

        assert!(hi[1].is_nan());
        assert_approx(hi[2], 13.0, DEFAULT_EPSILON);
        assert_approx(hi[4], 16.0, DEFAULT_EPSILON);
        assert_approx(lo[2], 9.0, DEFAULT_EPSILON);
        assert_approx(lo[4], 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn min_periods_allows_partial_window() {
        let closes: Vec<f64> = (0..6).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let ind = RollingExtreme::with_min_periods(Extreme::Highest, 10, 4);
        let result = ind.compute(&bars);

        assert!(result[2].is_nan());
        assert_approx(result[3], 104.0, DEFAULT_EPSILON);
        assert_approx(result[5], 106.0, DEFAULT_EPSILON);
        assert_eq!(ind.lookback(), 3);
    }

    #[test]
    fn nan_in_window_propagates() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        bars[1].high = f64::NAN;
        let result = RollingExtreme::highest(2).compute(&bars);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert!(!result[3].is_nan());
    }

    #[test]
    fn names() {
        assert_eq!(RollingExtreme::highest(10).name(), "highest_10");
        assert_eq!(RollingExtreme::lowest(10).name(), "lowest_10");
    }
}
