//! NSE equity listing as a universe source.
//!
//! The archive host refuses requests without the cookies set by the exchange
//! home page, so the provider warms a cookie-carrying session first and then
//! downloads the equity listing CSV.

use std::time::Duration;

use super::provider::{DataError, UniverseProvider};
use super::universe::filter_listing_symbols;
use crate::domain::Symbol;

const HOME_URL: &str = "https://www.nseindia.com";
const LISTING_URL: &str = "https://nsearchives.nseindia.com/content/equities/EQUITY_L.csv";

pub struct NseUniverseProvider {
    client: reqwest::blocking::Client,
    limit: usize,
    warmup_pause: Duration,
}

impl NseUniverseProvider {
    pub fn new(limit: usize) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            limit,
            warmup_pause: Duration::from_secs(1),
        })
    }

    /// Extract the SYMBOL column from the listing CSV.
    ///
    /// The published header has carried a leading space on some columns, so
    /// header names are compared after trimming.
    pub fn parse_listing(content: &str) -> Result<Vec<String>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| DataError::ResponseFormatChanged(format!("listing header: {e}")))?;
        let column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("SYMBOL"))
            .ok_or_else(|| {
                DataError::ResponseFormatChanged("listing has no SYMBOL column".into())
            })?;

        let mut symbols = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| DataError::ResponseFormatChanged(format!("listing row: {e}")))?;
            if let Some(symbol) = record.get(column).filter(|s| !s.is_empty()) {
                symbols.push(symbol.to_string());
            }
        }
        Ok(symbols)
    }

    fn download_listing(&self) -> Result<String, DataError> {
        // Warmup failures are not fatal; the listing request reports the real error.
        if let Err(e) = self.client.get(HOME_URL).send() {
            tracing::debug!(error = %e, "NSE session warmup failed");
        }
        std::thread::sleep(self.warmup_pause);

        let resp = self
            .client
            .get(LISTING_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(DataError::AuthenticationRequired(format!(
                "NSE listing refused with HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(DataError::Other(format!("HTTP {status} for NSE listing")));
        }
        resp.text()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))
    }
}

impl UniverseProvider for NseUniverseProvider {
    fn name(&self) -> &str {
        "nse_equity_listing"
    }

    fn symbols(&self) -> Result<Vec<Symbol>, DataError> {
        let content = self.download_listing()?;
        let raw = Self::parse_listing(&content)?;
        let symbols = filter_listing_symbols(raw.iter().map(String::as_str), self.limit);
        tracing::info!(listed = raw.len(), kept = symbols.len(), "fetched NSE listing");
        Ok(symbols)
    }
}
