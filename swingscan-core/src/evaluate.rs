//! Per-instrument evaluation: snapshot, gate chain, signal record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::gate::{GateCause, GateChain, GateContext, GateFailure};
use crate::domain::{BarSeries, PriceBand, RewardRatios, SignalRecord};
use crate::params::ScreenParams;
use crate::relative_strength::BenchmarkReturn;
use crate::snapshot::{IndicatorSnapshot, InsufficientData};

/// Why an instrument produced no signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    InsufficientHistory(InsufficientData),
    Gate(GateFailure),
    /// The provider could not supply bars for the instrument.
    DataUnavailable { reason: String },
    /// The screen parameters failed validation; nothing was computed.
    InvalidParams { reason: String },
}

impl Rejection {
    /// Short stable label, used as the key of the rejection histogram.
    pub fn label(&self) -> String {
        match self {
            Rejection::InsufficientHistory(_) => "insufficient_history".to_string(),
            Rejection::Gate(failure) => failure.gate.name().to_string(),
            Rejection::DataUnavailable { .. } => "data_unavailable".to_string(),
            Rejection::InvalidParams { .. } => "invalid_params".to_string(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InsufficientHistory(e) => write!(f, "{e}"),
            Rejection::Gate(failure) => write!(f, "{failure}"),
            Rejection::DataUnavailable { reason } => write!(f, "data unavailable: {reason}"),
            Rejection::InvalidParams { reason } => write!(f, "invalid screen parameters: {reason}"),
        }
    }
}

/// Result of screening one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
    Accepted(SignalRecord),
    Rejected(Rejection),
}

impl Evaluation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Evaluation::Accepted(_))
    }

    pub fn signal(&self) -> Option<&SignalRecord> {
        match self {
            Evaluation::Accepted(record) => Some(record),
            Evaluation::Rejected(_) => None,
        }
    }

    pub fn into_signal(self) -> Option<SignalRecord> {
        match self {
            Evaluation::Accepted(record) => Some(record),
            Evaluation::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Evaluation::Accepted(_) => None,
            Evaluation::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Screen one instrument with the canonical gate order.
pub fn evaluate_instrument(
    series: &BarSeries,
    benchmark: BenchmarkReturn,
    params: &ScreenParams,
) -> Evaluation {
    evaluate_with_chain(series, benchmark, params, &GateChain::canonical())
}

/// Screen one instrument with a caller-supplied gate order.
///
/// Pure: no I/O, no shared state. The outcome depends only on the arguments.
/// Parameters that fail `ScreenParams::validate` reject every instrument.
pub fn evaluate_with_chain(
    series: &BarSeries,
    benchmark: BenchmarkReturn,
    params: &ScreenParams,
    chain: &GateChain,
) -> Evaluation {
    if let Err(e) = params.validate() {
        return Evaluation::Rejected(Rejection::InvalidParams {
            reason: e.to_string(),
        });
    }

    let snapshot = match IndicatorSnapshot::compute(series, &params.indicators) {
        Ok(snapshot) => snapshot,
        Err(e) => return Evaluation::Rejected(Rejection::InsufficientHistory(e)),
    };

    let ctx = GateContext::new(series, &snapshot, benchmark, params);
    if let Err(failure) = chain.run(&ctx) {
        return Evaluation::Rejected(Rejection::Gate(failure));
    }

    match build_record(&ctx) {
        Ok(record) => {
            tracing::debug!(
                symbol = %record.symbol,
                rr = record.reward_ratios.near,
                "signal accepted"
            );
            Evaluation::Accepted(record)
        }
        Err(failure) => Evaluation::Rejected(Rejection::Gate(failure)),
    }
}

/// Assemble the record for an instrument that passed every gate.
///
/// Every derived value was already checked by its gate, so an error here
/// means the chain did not contain that gate.
fn build_record(ctx: &GateContext<'_>) -> Result<SignalRecord, GateFailure> {
    use crate::components::gate::Gate;

    let fail = |gate: Gate| move |cause: GateCause| GateFailure { gate, cause };

    let snap = ctx.snapshot;
    let thresholds = &ctx.params.thresholds;
    let plan = ctx.risk_reward().map_err(fail(Gate::RiskCeiling))?;
    let momentum_pct = ctx.momentum_pct().map_err(fail(Gate::Momentum))?;
    let volume_ratio = ctx.volume_ratio().map_err(fail(Gate::Volume))?;
    let strength = ctx.relative_strength().map_err(fail(Gate::RelativeStrength))?;
    let distance = ctx
        .distance_from_high()
        .map_err(fail(Gate::ProximityToHigh))?;
    let range_pct = ctx.range_pct().map_err(fail(Gate::VolatilityCompression))?;

    Ok(SignalRecord {
        symbol: ctx.series.symbol().to_string(),
        as_of: snap.as_of,
        price: snap.close,
        buy_range: PriceBand::around(snap.close, thresholds.buy_band),
        target_near: plan.target_near,
        target_far: plan.target_far,
        stop_loss: plan.stop_loss,
        reward_ratios: RewardRatios {
            near: plan.ratio_near,
            far: plan.ratio_far,
        },
        momentum_pct,
        rsi: snap.rsi,
        volume_ratio,
        relative_strength_pct: strength.spread_pct(),
        distance_from_high_pct: -distance * 100.0,
        range_pct,
        risk_pct: plan.risk_pct(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::gate::Gate;
    use crate::sample;

    fn bench(ret: f64) -> BenchmarkReturn {
        BenchmarkReturn::new(ret).unwrap()
    }

    #[test]
    fn setup_is_accepted_with_tight_stop() {
        let series = sample::swing_setup("SETUP");
        let params = sample::tight_stop_params();
        let record = evaluate_instrument(&series, bench(0.02), &params)
            .into_signal()
            .expect("accepted");

        assert_eq!(record.symbol, "SETUP");
        assert_eq!(record.price, 100.0);
        assert!((record.stop_loss - 97.4 * 0.995).abs() < 1e-9);
        assert!((record.target_near - 105.0).abs() < 1e-9);
        assert!((record.target_far - 110.0).abs() < 1e-9);
        assert!((record.reward_ratios.far - 2.0 * record.reward_ratios.near).abs() < 1e-9);
        assert!(record.buy_range.contains(100.0));
        assert!(record.distance_from_high_pct <= 0.0);
        assert!(record.beats_benchmark());
        assert!(record.risk_pct <= params.thresholds.max_risk_pct);
    }

    #[test]
    fn default_stop_rejects_at_risk_ceiling() {
        let series = sample::swing_setup("SETUP");
        let eval = evaluate_instrument(&series, bench(0.02), &ScreenParams::default());
        match eval.rejection() {
            Some(Rejection::Gate(failure)) => assert_eq!(failure.gate, Gate::RiskCeiling),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(eval.rejection().map(Rejection::label).as_deref(), Some("risk_ceiling"));
    }

    #[test]
    fn short_history_is_rejected_before_gates() {
        let series = sample::trending_series("SHORT", 150);
        let eval = evaluate_instrument(&series, bench(0.0), &ScreenParams::default());
        assert_eq!(
            eval,
            Evaluation::Rejected(Rejection::InsufficientHistory(InsufficientData {
                bars: 150,
                required: 200,
            }))
        );
    }

    #[test]
    fn evaluation_serializes_with_tag() {
        let series = sample::flat_series("FLAT", 250, 10.0);
        let eval = evaluate_instrument(&series, bench(0.0), &ScreenParams::default());
        let json = serde_json::to_string(&eval).unwrap();
        assert!(json.contains("\"outcome\":\"rejected\""), "{json}");
        assert!(json.contains("\"trend\""), "{json}");
    }

    #[test]
    fn zero_window_is_rejected_not_panicking() {
        let series = sample::swing_setup("SETUP");
        let mut params = sample::tight_stop_params();
        params.indicators.fast_sma = 0;
        let eval = evaluate_instrument(&series, bench(0.02), &params);
        match eval.rejection() {
            Some(Rejection::InvalidParams { reason }) => assert!(reason.contains("fast_sma")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(eval.rejection().map(Rejection::label).as_deref(), Some("invalid_params"));
    }
}
