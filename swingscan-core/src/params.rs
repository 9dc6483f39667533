//! Screen parameters: indicator windows and gate thresholds.
//!
//! Every number the gate chain compares against lives here as a named field.
//! Defaults reproduce the production screen; tests and config files override
//! individual fields (all structs are `#[serde(default)]`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Window lengths for the indicator snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    /// Series shorter than this are rejected as insufficient history.
    pub min_bars: usize,
    pub fast_sma: usize,
    pub slow_sma: usize,
    pub rsi_period: usize,
    /// Window for the recent high/low range (and the stop-loss anchor).
    pub range_window: usize,
    /// Window for the 52-period high.
    pub high_window: usize,
    /// Minimum bars before the 52-period high is defined.
    pub high_min_periods: usize,
    pub volume_window: usize,
    /// Momentum base is the close this many bars back, counting the latest bar as 1.
    pub momentum_lookback: usize,
    /// Relative-strength base, counted the same way.
    pub relative_strength_lookback: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            min_bars: 200,
            fast_sma: 50,
            slow_sma: 200,
            rsi_period: 14,
            range_window: 10,
            high_window: 252,
            high_min_periods: 200,
            volume_window: 10,
            momentum_lookback: 10,
            relative_strength_lookback: 21,
        }
    }
}

/// Gate thresholds and trade-plan multipliers.
///
/// Percent-valued fields (`*_pct`) are in percent units (2.0 = 2%); the rest
/// are fractions or multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_momentum_pct: f64,
    /// Minimum position of the close inside the recent range (0..1).
    pub min_range_position: f64,
    /// Maximum fractional distance below the 52-period high.
    pub max_distance_from_high: f64,
    /// Close must be at least this multiple of the slow SMA.
    pub slow_sma_margin: f64,
    pub max_range_pct: f64,
    pub max_rsi: f64,
    pub max_momentum_pct: f64,
    /// Latest volume must be at least this multiple of the average volume.
    pub min_volume_ratio: f64,
    pub max_risk_pct: f64,
    /// Minimum reward-to-risk ratio at the near target.
    pub min_reward_ratio: f64,
    /// Instrument return must exceed benchmark return times this multiplier.
    pub benchmark_margin: f64,
    /// Stop-loss = recent low times this factor.
    pub stop_loss_factor: f64,
    /// Near profit target as a fraction above price.
    pub near_target: f64,
    /// Far profit target as a fraction above price.
    pub far_target: f64,
    /// Half-width of the buy range as a fraction of price.
    pub buy_band: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_momentum_pct: 2.0,
            min_range_position: 0.85,
            max_distance_from_high: 0.25,
            slow_sma_margin: 1.02,
            max_range_pct: 12.0,
            max_rsi: 70.0,
            max_momentum_pct: 18.0,
            min_volume_ratio: 0.8,
            max_risk_pct: 7.0,
            min_reward_ratio: 1.3,
            benchmark_margin: 1.10,
            stop_loss_factor: 0.95,
            near_target: 0.05,
            far_target: 0.10,
            buy_band: 0.01,
        }
    }
}

/// Everything a single-instrument evaluation needs besides data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    pub indicators: IndicatorParams,
    pub thresholds: Thresholds,
}

impl ScreenParams {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject windows that would make indicators panic or read past the series.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        let windows = [
            ("fast_sma", ind.fast_sma),
            ("slow_sma", ind.slow_sma),
            ("rsi_period", ind.rsi_period),
            ("range_window", ind.range_window),
            ("high_window", ind.high_window),
            ("high_min_periods", ind.high_min_periods),
            ("volume_window", ind.volume_window),
            ("momentum_lookback", ind.momentum_lookback),
            ("relative_strength_lookback", ind.relative_strength_lookback),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 1")));
            }
        }
        if ind.high_min_periods > ind.high_window {
            return Err(ConfigError::Invalid(
                "high_min_periods must not exceed high_window".into(),
            ));
        }
        let th = &self.thresholds;
        if !th.stop_loss_factor.is_finite() || th.stop_loss_factor <= 0.0 {
            return Err(ConfigError::Invalid("stop_loss_factor must be positive".into()));
        }
        if th.near_target <= 0.0 || th.far_target <= 0.0 {
            return Err(ConfigError::Invalid("profit targets must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_screen() {
        let p = ScreenParams::default();
        assert_eq!(p.indicators.min_bars, 200);
        assert_eq!(p.indicators.high_window, 252);
        assert_eq!(p.thresholds.max_rsi, 70.0);
        assert_eq!(p.thresholds.benchmark_margin, 1.10);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let p = ScreenParams::from_toml(
            r#"
[thresholds]
min_reward_ratio = 1.0
stop_loss_factor = 0.99
"#,
        )
        .unwrap();
        assert_eq!(p.thresholds.min_reward_ratio, 1.0);
        assert_eq!(p.thresholds.stop_loss_factor, 0.99);
        assert_eq!(p.thresholds.max_risk_pct, 7.0);
        assert_eq!(p.indicators, IndicatorParams::default());
    }

    #[test]
    fn toml_roundtrip() {
        let p = ScreenParams::default();
        let text = p.to_toml().unwrap();
        assert_eq!(ScreenParams::from_toml(&text).unwrap(), p);
    }

    #[test]
    fn zero_window_rejected() {
        let err = ScreenParams::from_toml("[indicators]\nrsi_period = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn min_periods_above_window_rejected() {
        let err =
            ScreenParams::from_toml("[indicators]\nhigh_window = 100\nhigh_min_periods = 150\n")
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
