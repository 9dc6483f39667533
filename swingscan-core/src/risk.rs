//! Risk/reward plan: stop-loss under the recent low, two fixed profit targets.

use serde::{Deserialize, Serialize};

use crate::params::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub entry: f64,
    pub stop_loss: f64,
    /// entry - stop_loss, always > 0.
    pub risk: f64,
    /// risk / entry (fraction).
    pub risk_fraction: f64,
    pub target_near: f64,
    pub target_far: f64,
    pub ratio_near: f64,
    pub ratio_far: f64,
}

impl RiskReward {
    /// Build the plan for `entry` anchored at `recent_low`.
    ///
    /// Returns `None` when the stop sits at or above the entry, or when any
    /// derived value is not finite.
    pub fn compute(entry: f64, recent_low: f64, thresholds: &Thresholds) -> Option<Self> {
        let stop_loss = recent_low * thresholds.stop_loss_factor;
        let risk = entry - stop_loss;
        if risk.is_nan() || risk <= 0.0 || !entry.is_finite() || !risk.is_finite() {
            return None;
        }

        let target_near = entry * (1.0 + thresholds.near_target);
        let target_far = entry * (1.0 + thresholds.far_target);
        let plan = Self {
            entry,
            stop_loss,
            risk,
            risk_fraction: risk / entry,
            target_near,
            target_far,
            ratio_near: (target_near - entry) / risk,
            ratio_far: (target_far - entry) / risk,
        };

        let finite = [plan.risk_fraction, plan.ratio_near, plan.ratio_far]
            .iter()
            .all(|v| v.is_finite());
        finite.then_some(plan)
    }

    pub fn risk_pct(&self) -> f64 {
        self.risk_fraction * 100.0
    }
}
