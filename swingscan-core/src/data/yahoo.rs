//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//!
//! Exchange listings are requested with a suffix (`RELIANCE` -> `RELIANCE.NS`);
//! index symbols starting with `^` are requested as-is. The returned series is
//! labelled with the symbol the caller asked for.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    symbol_suffix: String,
    max_retries: u32,
    base_delay: Duration,
    /// Cap on a server-requested `Retry-After` wait.
    max_rate_limit_wait: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            symbol_suffix: String::new(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_rate_limit_wait: Duration::from_secs(30),
        })
    }

    /// Exchange suffix appended to non-index symbols (e.g. `.NS`).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.symbol_suffix = suffix.into();
        self
    }

    /// Provider ticker for an exchange symbol.
    pub fn ticker(&self, symbol: &str) -> String {
        if symbol.starts_with('^') || symbol.ends_with(&self.symbol_suffix) {
            symbol.to_string()
        } else {
            format!("{symbol}{}", self.symbol_suffix)
        }
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let path = ticker.replace('^', "%5E").replace('&', "%26");
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{path}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<BarSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let field = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten().unwrap_or(f64::NAN);

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Holiday placeholders come back as all-null rows and are dropped
            // by canonicalization.
            bars.push(Bar {
                date,
                open: field(&quote.open, i),
                high: field(&quote.high, i),
                low: field(&quote.low, i),
                close: field(&quote.close, i),
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        let series = BarSeries::canonicalize(symbol, bars);
        if series.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(series)
    }

    /// One HTTP round trip. `Ok(Err(_))` is a transient failure worth retrying.
    fn attempt(
        &self,
        symbol: &str,
        ticker: &str,
        url: &str,
    ) -> Result<Result<BarSeries, DataError>, DataError> {
        use reqwest::StatusCode;

        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Ok(Err(DataError::NetworkUnreachable(e.to_string())))
            }
            Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
        };

        match resp.status() {
            StatusCode::FORBIDDEN => {
                self.circuit_breaker.trip();
                Err(DataError::CircuitBreakerTripped)
            }
            StatusCode::UNAUTHORIZED => Err(DataError::AuthenticationRequired(format!(
                "chart request for {ticker} was refused"
            ))),
            StatusCode::NOT_FOUND => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Ok(Err(DataError::RateLimited { retry_after_secs }))
            }
            status if !status.is_success() => {
                self.circuit_breaker.record_failure();
                Ok(Err(DataError::Other(format!("HTTP {status} for {ticker}"))))
            }
            _ => {
                let chart: ChartResponse = resp.json().map_err(|e| {
                    DataError::ResponseFormatChanged(format!("unreadable chart for {ticker}: {e}"))
                })?;
                let series = Self::parse_response(symbol, chart)?;
                self.circuit_breaker.record_success();
                Ok(Ok(series))
            }
        }
    }

    /// Wait before retry number `attempt` (1-based) after `last_error`.
    ///
    /// A rate limit waits for the server's `Retry-After`, capped; anything
    /// else backs off exponentially from `base_delay`.
    fn retry_delay(&self, attempt: u32, last_error: &DataError) -> Duration {
        match last_error {
            DataError::RateLimited { retry_after_secs } => {
                Duration::from_secs(*retry_after_secs).min(self.max_rate_limit_wait)
            }
            _ => self.base_delay * 2u32.pow(attempt.saturating_sub(1)),
        }
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let ticker = self.ticker(symbol);
        let url = Self::chart_url(&ticker, start, end);
        let mut last_error = DataError::Other("no attempts made".into());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_delay(attempt, &last_error);
                tracing::debug!(%ticker, attempt, ?delay, error = %last_error, "retrying chart request");
                std::thread::sleep(delay);
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }
            match self.attempt(symbol, &ticker, &url)? {
                Ok(series) => return Ok(series),
                Err(transient) => last_error = transient,
            }
        }

        tracing::warn!(%ticker, error = %last_error, "giving up on chart request");
        Err(last_error)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        self.fetch_with_retry(symbol, start, end)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
