//! Average volume over a trailing window.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct AverageVolume {
    period: usize,
    name: String,
}

impl AverageVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume period must be >= 1");
        Self {
            period,
            name: format!("avg_volume_{period}"),
        }
    }
}

impl Indicator for AverageVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        for (start, window) in bars.windows(self.period).enumerate() {
            let total: f64 = window.iter().map(|b| b.volume as f64).sum();
            result[start + self.period - 1] = total / self.period as f64;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn average_includes_latest_bar() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = (i as u64 + 1) * 100;
        }
        let result = AverageVolume::new(2).compute(&bars);
        assert!(result[0].is_nan());
        assert_approx(result[1], 150.0, DEFAULT_EPSILON);
        assert_approx(result[3], 350.0, DEFAULT_EPSILON);
    }
}
