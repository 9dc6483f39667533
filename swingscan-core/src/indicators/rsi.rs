//! Relative Strength Index (RSI), simple-average variant.
//!
//! avg_gain / avg_loss are plain means of the last `period` close deltas
//! (no Wilder smoothing). RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period.
//!
//! A zero average loss leaves RS undefined and the value is NaN; callers treat
//! NaN as disqualifying.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let deltas: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

        for (offset, window) in deltas.windows(self.period).enumerate() {
            let mut gains = 0.0;
            let mut losses = 0.0;
            for &d in window {
                if d.is_nan() {
                    gains = f64::NAN;
                } else if d > 0.0 {
                    gains += d;
                } else {
                    losses -= d;
                }
            }
            let period = self.period as f64;
            result[offset + self.period] = rsi_from_means(gains / period, losses / period);
        }

        result
    }
}

fn rsi_from_means(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 || avg_gain.is_nan() || avg_loss.is_nan() {
        return f64::NAN;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_mixed() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // period=3 at index 3: gains 0.34, losses 0.73 → RS = 0.34/0.73
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
        // index 4: -0.25, -0.48, +0.72 → RS = 0.72/0.73
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_all_gains_is_undefined() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for (i, v) in Rsi::new(3).compute(&bars).into_iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_nan_in_window() {
        let mut bars = make_bars(&[100.0, 99.0, 101.0, 100.0, 102.0, 101.0, 103.0]);
        bars[2].close = f64::NAN;
        let result = Rsi::new(3).compute(&bars);
        // deltas 2 and 3 are NaN; windows touching them are NaN
        assert!(result[3].is_nan());
        assert!(result[5].is_nan());
        assert!(!result[6].is_nan());
    }
}
