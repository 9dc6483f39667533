//! Data provider traits and structured error types.
//!
//! `DataProvider` abstracts over bar sources (Yahoo Finance, a CSV directory,
//! a synthetic generator) so the scan can swap implementations and tests can
//! run offline. `UniverseProvider` does the same for the instrument list.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{BarSeries, Symbol};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("malformed data for {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Source of daily bars.
///
/// Implementations return a canonical `BarSeries` labelled with the symbol
/// as requested (exchange suffixes are the provider's concern).
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<BarSeries, DataError>;

    /// Whether the provider is currently accepting requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Source of the instrument list to scan.
pub trait UniverseProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Deduplicated symbols, in listing order.
    fn symbols(&self) -> Result<Vec<Symbol>, DataError>;
}

impl<T: DataProvider + ?Sized> DataProvider for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        (**self).fetch(symbol, start, end)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: DataProvider + ?Sized> DataProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        (**self).fetch(symbol, start, end)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
