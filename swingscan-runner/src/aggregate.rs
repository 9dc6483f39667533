//! Reduction of per-instrument outcomes into a ranked scan report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use swingscan_core::{Evaluation, Rejection, SignalRecord};

use crate::scanner::{InstrumentOutcome, InstrumentResult};

/// Sort by the near-target reward ratio, best first.
///
/// The sort is stable, so equal ratios keep their scan order.
pub fn rank_signals(signals: &mut [SignalRecord]) {
    signals.sort_by(|a, b| b.rank_key().total_cmp(&a.rank_key()));
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCounts {
    pub universe: usize,
    pub accepted: usize,
    /// Rejected by a gate or for short history.
    pub rejected: usize,
    pub data_unavailable: usize,
    pub cancelled: usize,
}

impl ScanCounts {
    pub fn evaluated(&self) -> usize {
        self.universe - self.cancelled
    }
}

/// Everything derived from the per-instrument results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub counts: ScanCounts,
    /// Rejection label -> number of instruments.
    pub rejections: BTreeMap<String, usize>,
    /// Accepted setups, ranked.
    pub signals: Vec<SignalRecord>,
}

impl Aggregate {
    pub fn from_results(results: Vec<InstrumentResult>) -> Self {
        let mut agg = Aggregate {
            counts: ScanCounts {
                universe: results.len(),
                ..ScanCounts::default()
            },
            ..Aggregate::default()
        };

        for result in results {
            match result.outcome {
                InstrumentOutcome::Cancelled => agg.counts.cancelled += 1,
                InstrumentOutcome::Evaluated(Evaluation::Accepted(record)) => {
                    agg.counts.accepted += 1;
                    agg.signals.push(record);
                }
                InstrumentOutcome::Evaluated(Evaluation::Rejected(rejection)) => {
                    if matches!(rejection, Rejection::DataUnavailable { .. }) {
                        agg.counts.data_unavailable += 1;
                    } else {
                        agg.counts.rejected += 1;
                    }
                    *agg.rejections.entry(rejection.label()).or_default() += 1;
                }
            }
        }

        rank_signals(&mut agg.signals);
        agg
    }
}

/// Averages over the accepted setups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub count: usize,
    pub avg_risk_pct: f64,
    pub avg_reward_ratio: f64,
    pub avg_rsi: f64,
    pub beating_benchmark: usize,
}

impl ScanSummary {
    /// Averages over `signals`; `None` for an empty slice.
    pub fn from_signals(signals: &[SignalRecord]) -> Option<Self> {
        if signals.is_empty() {
            return None;
        }
        let n = signals.len() as f64;
        let mean = |f: fn(&SignalRecord) -> f64| signals.iter().map(f).sum::<f64>() / n;
        Some(ScanSummary {
            count: signals.len(),
            avg_risk_pct: mean(|r| r.risk_pct),
            avg_reward_ratio: mean(|r| r.reward_ratios.near),
            avg_rsi: mean(|r| r.rsi),
            beating_benchmark: signals.iter().filter(|r| r.beats_benchmark()).count(),
        })
    }
}

/// Finished scan.
///
/// An empty `signals` list is a normal outcome (nothing qualified today) and
/// is distinct from a scan that failed to obtain its universe or benchmark,
/// which never produces a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub as_of: NaiveDate,
    pub benchmark_symbol: String,
    /// Trailing benchmark return (fraction).
    pub benchmark_return: f64,
    /// Fingerprint of the scan configuration.
    pub fingerprint: String,
    #[serde(flatten)]
    pub aggregate: Aggregate,
}

impl ScanReport {
    pub fn signals(&self) -> &[SignalRecord] {
        &self.aggregate.signals
    }

    pub fn has_signals(&self) -> bool {
        !self.aggregate.signals.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.aggregate.counts.cancelled > 0
    }

    pub fn top(&self, n: usize) -> &[SignalRecord] {
        let signals = self.signals();
        &signals[..n.min(signals.len())]
    }

    /// Rejection histogram, most common first.
    pub fn rejection_histogram(&self) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = self
            .aggregate
            .rejections
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// `None` when nothing was accepted.
    pub fn summary(&self) -> Option<ScanSummary> {
        ScanSummary::from_signals(self.signals())
    }
}
