//! SignalRecord: one accepted swing setup.
//!
//! Every field is numeric. Currency symbols, `1:x` ratio strings and percent
//! suffixes are produced by the export adapter, never here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive price band around the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub low: f64,
    pub high: f64,
}

impl PriceBand {
    /// Symmetric band of `width` (fraction) around `price`.
    pub fn around(price: f64, width: f64) -> Self {
        Self {
            low: price * (1.0 - width),
            high: price * (1.0 + width),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// Reward-to-risk ratios at the near and far profit targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardRatios {
    pub near: f64,
    pub far: f64,
}

/// An instrument that survived the full gate chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: String,
    /// Date of the bar the setup was evaluated on.
    pub as_of: NaiveDate,
    pub price: f64,
    pub buy_range: PriceBand,
    pub target_near: f64,
    pub target_far: f64,
    pub stop_loss: f64,
    pub reward_ratios: RewardRatios,
    /// Percent change over the momentum lookback (two weeks by default).
    pub momentum_pct: f64,
    pub rsi: f64,
    /// Latest volume divided by the trailing average volume.
    pub volume_ratio: f64,
    /// Instrument return minus benchmark return over the relative-strength lookback, in percent.
    pub relative_strength_pct: f64,
    /// Distance below the 52-period high, in percent (zero or negative).
    pub distance_from_high_pct: f64,
    pub range_pct: f64,
    pub risk_pct: f64,
}

impl SignalRecord {
    /// Ranking key: the reward ratio at the near target.
    pub fn rank_key(&self) -> f64 {
        self.reward_ratios.near
    }

    pub fn beats_benchmark(&self) -> bool {
        self.relative_strength_pct > 0.0
    }
}
