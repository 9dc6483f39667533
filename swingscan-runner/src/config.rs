//! Serializable scan configuration.
//!
//! A `ScanConfig` captures everything needed to reproduce a scan apart from
//! the market data itself: where symbols come from, how far back to fetch,
//! how many workers to run, and the screen parameters. Loaded from TOML with
//! every field optional; CLI flags override individual fields afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use swingscan_core::{ConfigError, ScreenParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Index the relative-strength gate compares against.
    pub benchmark_symbol: String,
    /// Suffix the bar provider appends to exchange symbols.
    pub symbol_suffix: String,
    /// Calendar days of instrument history to request.
    pub history_days: i64,
    /// Calendar days of benchmark history to request.
    pub benchmark_history_days: i64,
    pub universe_limit: usize,
    pub workers: usize,
    /// Minimum spacing between provider requests, shared by all workers.
    pub request_delay_ms: u64,
    /// Print a progress line every this many instruments (0 disables).
    pub progress_every: usize,
    pub output_dir: PathBuf,
    pub screen: ScreenParams,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            benchmark_symbol: "^NSEI".into(),
            symbol_suffix: ".NS".into(),
            history_days: 365,
            benchmark_history_days: 213,
            universe_limit: 1000,
            workers: 4,
            request_delay_ms: 80,
            progress_every: 50,
            output_dir: PathBuf::from("."),
            screen: ScreenParams::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be >= 1".into()));
        }
        if self.history_days <= 0 || self.benchmark_history_days <= 0 {
            return Err(ConfigError::Invalid("history windows must be positive".into()));
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("benchmark_symbol must not be empty".into()));
        }
        self.screen.validate()
    }

    /// Content hash of the settings that decide scan results, stamped into
    /// every scan manifest.
    ///
    /// Execution knobs (workers, request pacing, progress cadence, output
    /// directory) are left out: they never change which records come back.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let fields = ResultFields {
            benchmark_symbol: &self.benchmark_symbol,
            symbol_suffix: &self.symbol_suffix,
            history_days: self.history_days,
            benchmark_history_days: self.benchmark_history_days,
            universe_limit: self.universe_limit,
            screen: &self.screen,
        };
        let canonical = toml::to_string(&fields)?;
        Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

#[derive(Serialize)]
struct ResultFields<'a> {
    benchmark_symbol: &'a str,
    symbol_suffix: &'a str,
    history_days: i64,
    benchmark_history_days: i64,
    universe_limit: usize,
    screen: &'a ScreenParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_scan() {
        let c = ScanConfig::default();
        assert_eq!(c.benchmark_symbol, "^NSEI");
        assert_eq!(c.symbol_suffix, ".NS");
        assert_eq!(c.universe_limit, 1000);
        assert_eq!(c.request_delay_ms, 80);
        assert_eq!(c.benchmark_history_days, 213);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = ScanConfig::from_toml(
            "workers = 8\n[screen.thresholds]\nmax_rsi = 65.0\nstop_loss_factor = 0.99\n",
        )
        .unwrap();
        assert_eq!(c.workers, 8);
        assert_eq!(c.screen.thresholds.max_rsi, 65.0);
        assert_eq!(c.screen.thresholds.max_risk_pct, 7.0);
        assert_eq!(c.history_days, 365);
    }

    #[test]
    fn rejects_zero_workers() {
        let err = ScanConfig::from_toml("workers = 0").unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn fingerprint_tracks_settings() {
        let a = ScanConfig::default();
        let mut b = ScanConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.screen.thresholds.min_reward_ratio = 1.5;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn fingerprint_ignores_execution_settings() {
        let a = ScanConfig::default();
        let mut b = ScanConfig::default();
        b.workers = 16;
        b.request_delay_ms = 0;
        b.progress_every = 0;
        b.output_dir = PathBuf::from("/tmp/elsewhere");
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        b.universe_limit = 10;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn toml_roundtrip() {
        let c = ScanConfig::default();
        let back = ScanConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }
}
