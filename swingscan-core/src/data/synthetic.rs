//! Seeded random-walk bars for demos and offline runs.
//!
//! Each symbol gets its own RNG stream derived from the master seed and the
//! symbol name with BLAKE3, so the bars for a symbol do not depend on which
//! other symbols were requested or in what order.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    /// Mean daily drift (fraction).
    drift: f64,
    /// Half-width of the uniform daily shock (fraction).
    volatility: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            drift: 0.0008,
            volatility: 0.02,
        }
    }

    /// Override drift and shock size. Volatility is floored so ranges stay non-empty.
    pub fn with_drift(mut self, drift: f64, volatility: f64) -> Self {
        self.drift = drift;
        self.volatility = volatility.max(1e-6);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Generate weekday bars over `[start, end]` for `symbol`.
    pub fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> BarSeries {
        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut close: f64 = rng.gen_range(50.0..1500.0);
        let base_volume: u64 = rng.gen_range(50_000..5_000_000);

        let bars = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|date| {
                let open = close;
                let shock = rng.gen_range(-self.volatility..=self.volatility);
                close = (open * (1.0 + self.drift + shock)).max(0.01);
                let wick_up = rng.gen_range(0.0..self.volatility / 2.0);
                let wick_down = rng.gen_range(0.0..self.volatility / 2.0);
                let volume = (base_volume as f64 * rng.gen_range(0.5..1.5)) as u64;
                Bar {
                    date,
                    open,
                    high: open.max(close) * (1.0 + wick_up),
                    low: open.min(close) * (1.0 - wick_down),
                    close,
                    volume,
                }
            })
            .collect();

        BarSeries::canonicalize(symbol, bars)
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        if end < start {
            return Err(DataError::Other(format!(
                "empty date range {start}..{end} for {symbol}"
            )));
        }
        Ok(self.generate(symbol, start, end))
    }
}
