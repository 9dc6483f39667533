//! Canned bar series for tests, benchmarks and demos.
//!
//! `swing_setup` is a textbook compression breakout: a steady one-year uptrend
//! followed by a ten-session zigzag that closes at the top of its range. With
//! `tight_stop_params` it passes every gate; with the default stop factor it
//! fails the risk ceiling (stop 5% under the recent low is too far away).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::domain::{Bar, BarSeries};
use crate::params::ScreenParams;

/// Closes of the final ten sessions of `swing_setup`.
const SETUP_TAIL: [f64; 10] = [97.5, 99.0, 98.0, 99.5, 98.3, 99.6, 98.6, 99.7, 98.9, 100.0];

/// Number of bars in `swing_setup`.
pub const SETUP_LEN: usize = 260;

/// `n` consecutive weekdays starting on 2024-01-01.
pub fn trading_dates(n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    while dates.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day += Duration::days(1);
    }
    dates
}

/// Build a series from closes with a fixed half-spread and constant volume.
pub fn series_from_closes(symbol: &str, closes: &[f64], spread: f64, volume: u64) -> BarSeries {
    let bars = trading_dates(closes.len())
        .into_iter()
        .zip(closes)
        .map(|(date, &close)| Bar {
            date,
            open: close,
            high: close + spread,
            low: close - spread,
            close,
            volume,
        })
        .collect();
    BarSeries::canonicalize(symbol, bars)
}

/// Uptrend from 50 to 97 followed by a tight zigzag ending at 100.
pub fn swing_setup(symbol: &str) -> BarSeries {
    setup_with_tail(symbol, &SETUP_TAIL)
}

/// `SETUP_LEN` bars: a linear climb from 50 to 97, then `tail` as the final closes.
pub fn setup_with_tail(symbol: &str, tail: &[f64]) -> BarSeries {
    let trend_len = SETUP_LEN.saturating_sub(tail.len()).max(2);
    let slope = 47.0 / (trend_len - 1) as f64;
    let closes: Vec<f64> = (0..trend_len)
        .map(|i| 50.0 + i as f64 * slope)
        .chain(tail.iter().copied())
        .collect();
    series_from_closes(symbol, &closes, 0.1, 1_000_000)
}

/// Straight-line uptrend of `n` bars (no down days, so RSI is undefined).
pub fn trending_series(symbol: &str, n: usize) -> BarSeries {
    let closes: Vec<f64> = (0..n).map(|i| 50.0 + i as f64 * 0.2).collect();
    series_from_closes(symbol, &closes, 0.5, 500_000)
}

/// `n` identical bars at `price` with zero intrabar range.
pub fn flat_series(symbol: &str, n: usize, price: f64) -> BarSeries {
    series_from_closes(symbol, &vec![price; n], 0.0, 100_000)
}

/// Benchmark whose trailing 21-bar return is `ret`: flat at 100, last bar moved.
pub fn benchmark_series(symbol: &str, n: usize, ret: f64) -> BarSeries {
    let mut closes = vec![100.0; n];
    if let Some(last) = closes.last_mut() {
        *last = 100.0 * (1.0 + ret);
    }
    series_from_closes(symbol, &closes, 0.5, 1_000_000)
}

/// Default screen with the stop placed 0.5% under the recent low.
pub fn tight_stop_params() -> ScreenParams {
    let mut params = ScreenParams::default();
    params.thresholds.stop_loss_factor = 0.995;
    params
}
