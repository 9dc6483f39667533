//! Fixed inter-request delay in front of another provider.
//!
//! Requests from all scan workers pass through one `governor` limiter with a
//! burst of one: each call waits until at least `delay` has elapsed since the
//! previous call was admitted.

use std::time::Duration;

use chrono::NaiveDate;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use super::provider::{DataError, DataProvider};
use crate::domain::BarSeries;

pub struct ThrottledProvider<P> {
    inner: P,
    delay: Duration,
    /// `None` when the delay is zero.
    limiter: Option<DefaultDirectRateLimiter>,
    clock: DefaultClock,
}

impl<P: DataProvider> ThrottledProvider<P> {
    pub fn new(inner: P, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            limiter: Quota::with_period(delay).map(RateLimiter::direct),
            clock: DefaultClock::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Block until the limiter admits one more request.
    fn wait_turn(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        while let Err(not_until) = limiter.check() {
            std::thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }
}

impl<P: DataProvider> DataProvider for ThrottledProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        self.wait_turn();
        self.inner.fetch(symbol, start, end)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticProvider;
    use std::sync::Arc;
    use std::time::Instant;

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        )
    }

    #[test]
    fn spaces_consecutive_requests() {
        let provider = ThrottledProvider::new(SyntheticProvider::new(7), Duration::from_millis(20));
        let (start, end) = window();

        let began = Instant::now();
        for symbol in ["A", "B", "C"] {
            provider.fetch(symbol, start, end).unwrap();
        }
        assert!(began.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn spacing_is_shared_across_threads() {
        let provider = Arc::new(ThrottledProvider::new(
            SyntheticProvider::new(7),
            Duration::from_millis(15),
        ));
        let (start, end) = window();

        let began = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || provider.fetch(&format!("S{i}"), start, end).is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert!(began.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn zero_delay_passes_through() {
        let provider = ThrottledProvider::new(SyntheticProvider::new(7), Duration::ZERO);
        assert_eq!(provider.name(), "synthetic");
        assert_eq!(provider.delay(), Duration::ZERO);
        let (start, end) = window();
        assert!(provider.fetch("A", start, end).is_ok());
    }
}
