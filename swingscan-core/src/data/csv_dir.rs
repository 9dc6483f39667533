//! Offline bar source: one CSV file per symbol in a directory.
//!
//! Expected layout is `<dir>/<SYMBOL>.csv` with a header row containing
//! `date, open, high, low, close, volume` (case-insensitive, any extra
//! columns ignored). Rows outside the requested date range are skipped.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE")]
    date: NaiveDate,
    #[serde(alias = "Open", alias = "OPEN")]
    open: Option<f64>,
    #[serde(alias = "High", alias = "HIGH")]
    high: Option<f64>,
    #[serde(alias = "Low", alias = "LOW")]
    low: Option<f64>,
    #[serde(alias = "Close", alias = "CLOSE")]
    close: Option<f64>,
    // Some exports write volume as a float ("1200.0").
    #[serde(alias = "Volume", alias = "VOLUME")]
    volume: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse CSV text into a series, keeping rows in `[start, end]`.
    pub fn parse(
        symbol: &str,
        content: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| DataError::Malformed {
                symbol: symbol.to_string(),
                reason: format!("row {}: {e}", line + 1),
            })?;
            if row.date < start || row.date > end {
                continue;
            }
            let price = |v: Option<f64>| v.unwrap_or(f64::NAN);
            bars.push(Bar {
                date: row.date,
                open: price(row.open),
                high: price(row.high),
                low: price(row.low),
                close: price(row.close),
                volume: row.volume.filter(|v| v.is_finite() && *v > 0.0).map_or(0, |v| v as u64),
            });
        }

        Ok(BarSeries::canonicalize(symbol, bars))
    }
}

impl DataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(symbol, &content, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn parses_mixed_case_headers_and_float_volume() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                   2025-03-04,10,11,9,10.5,10.5,1500.0\n\
                   2025-03-03,9,10,8,9.5,9.5,1200\n";
        let series = CsvDirProvider::parse("ABC", csv, day(1), day(31)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, day(3));
        assert_eq!(series.latest().unwrap().volume, 1500);
    }

    #[test]
    fn skips_rows_outside_range_and_empty_prices() {
        let csv = "date,open,high,low,close,volume\n\
                   2025-03-03,9,10,8,9.5,100\n\
                   2025-03-04,,,,,\n\
                   2025-03-20,9,10,8,9.5,100\n";
        let series = CsvDirProvider::parse("ABC", csv, day(1), day(10)).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn malformed_date_is_an_error() {
        let csv = "date,open,high,low,close,volume\nnot-a-date,1,1,1,1,1\n";
        let err = CsvDirProvider::parse("ABC", csv, day(1), day(10)).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn reads_symbol_file_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("XYZ.csv"),
            "date,open,high,low,close,volume\n2025-03-03,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        let provider = CsvDirProvider::new(dir.path());
        assert_eq!(provider.fetch("XYZ", day(1), day(31)).unwrap().len(), 1);
        assert!(matches!(
            provider.fetch("MISSING", day(1), day(31)),
            Err(DataError::SymbolNotFound { .. })
        ));
    }
}
