//! Browsing saved scans: load the newest manifest and narrow its records.
//!
//! Filtering works on the numeric `SignalRecord` fields, never on the
//! formatted CSV strings. Every bound is inclusive.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use swingscan_core::SignalRecord;

use crate::export::{latest_manifest, load_manifest, ScanManifest};

/// Inclusive `lo..hi` interval, parsed from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub lo: f64,
    pub hi: f64,
}

impl ValueRange {
    pub fn new(lo: f64, hi: f64) -> Option<Self> {
        (lo.is_finite() && hi.is_finite() && lo <= hi).then_some(Self { lo, hi })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

impl FromStr for ValueRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lo, hi) = s
            .split_once("..")
            .ok_or_else(|| format!("expected LO..HI, got {s:?}"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad bound {v:?}: {e}"))
        };
        Self::new(parse(lo)?, parse(hi)?).ok_or_else(|| format!("empty range {s:?}"))
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lo, self.hi)
    }
}

/// Post-scan narrowing of the saved setups. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalFilter {
    pub price: Option<ValueRange>,
    pub rsi: Option<ValueRange>,
    pub max_risk_pct: Option<f64>,
    /// Minimum reward ratio at the near target.
    pub min_reward_ratio: Option<f64>,
}

impl SignalFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &SignalRecord) -> bool {
        self.price.map_or(true, |r| r.contains(record.price))
            && self.rsi.map_or(true, |r| r.contains(record.rsi))
            && self.max_risk_pct.map_or(true, |max| record.risk_pct <= max)
            && self
                .min_reward_ratio
                .map_or(true, |min| record.reward_ratios.near >= min)
    }

    /// Matching records, in their saved (ranked) order.
    pub fn apply(&self, records: &[SignalRecord]) -> Vec<SignalRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// The newest saved scan in `dir`, or `None` when the directory holds none.
pub fn load_latest_scan(dir: &Path) -> Result<Option<(PathBuf, ScanManifest)>> {
    let Some(path) = latest_manifest(dir)? else {
        return Ok(None);
    };
    let manifest = load_manifest(&path)?;
    Ok(Some((path, manifest)))
}
