//! Gate chain: the ordered battery of pass/fail checks.
//!
//! Each gate is a pure predicate over a `GateContext`. The chain runs them in
//! order and stops at the first failure. Because no gate depends on another's
//! outcome, any permutation of the full chain reaches the same verdict; only
//! the reported failure point moves.
//!
//! Divisions by a quantity that can be zero or negative (range, low, risk,
//! base close) are checked first and reported as `GateCause::Degenerate`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::BarSeries;
use crate::params::ScreenParams;
use crate::relative_strength::{trailing_return, BenchmarkReturn, RelativeStrength};
use crate::risk::RiskReward;
use crate::snapshot::IndicatorSnapshot;

/// One check in the chain, named after what it screens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Close strictly above the fast SMA.
    Trend,
    /// Momentum over the lookback at least the minimum.
    Momentum,
    /// Close in the top part of the recent high/low range.
    BreakoutPosition,
    /// Close not too far under the 52-period high.
    ProximityToHigh,
    /// Close at least a margin above the slow SMA.
    LongTermTrend,
    /// Recent range narrow relative to the recent low.
    VolatilityCompression,
    /// RSI not above the overbought line.
    Overbought,
    /// Momentum not beyond the parabolic cap.
    Parabolic,
    /// Latest volume not far below its average.
    Volume,
    /// Stop-loss distance within the risk ceiling.
    RiskCeiling,
    /// Reward-to-risk at the near target at least the minimum.
    Reward,
    /// Trailing return beats the benchmark by the margin.
    RelativeStrength,
}

impl Gate {
    /// Canonical evaluation order, cheapest and most selective first.
    pub const CANONICAL: [Gate; 12] = [
        Gate::Trend,
        Gate::Momentum,
        Gate::BreakoutPosition,
        Gate::ProximityToHigh,
        Gate::LongTermTrend,
        Gate::VolatilityCompression,
        Gate::Overbought,
        Gate::Parabolic,
        Gate::Volume,
        Gate::RiskCeiling,
        Gate::Reward,
        Gate::RelativeStrength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gate::Trend => "trend",
            Gate::Momentum => "momentum",
            Gate::BreakoutPosition => "breakout_position",
            Gate::ProximityToHigh => "proximity_to_high",
            Gate::LongTermTrend => "long_term_trend",
            Gate::VolatilityCompression => "volatility_compression",
            Gate::Overbought => "overbought",
            Gate::Parabolic => "parabolic",
            Gate::Volume => "volume",
            Gate::RiskCeiling => "risk_ceiling",
            Gate::Reward => "reward",
            Gate::RelativeStrength => "relative_strength",
        }
    }

    /// 1-based position in the canonical order.
    pub fn position(self) -> usize {
        Self::CANONICAL
            .iter()
            .position(|g| *g == self)
            .map_or(0, |i| i + 1)
    }

    pub fn check(self, ctx: &GateContext<'_>) -> Result<(), GateCause> {
        let snap = ctx.snapshot;
        let th = &ctx.params.thresholds;
        match self {
            Gate::Trend => {
                let close = defined(snap.close)?;
                let sma = defined(snap.sma_fast)?;
                pass(close > sma)
            }
            Gate::Momentum => pass(ctx.momentum_pct()? >= th.min_momentum_pct),
            Gate::BreakoutPosition => pass(ctx.range_position()? >= th.min_range_position),
            Gate::ProximityToHigh => {
                pass(ctx.distance_from_high()? <= th.max_distance_from_high)
            }
            Gate::LongTermTrend => {
                let close = defined(snap.close)?;
                let sma = defined(snap.sma_slow)?;
                pass(close >= sma * th.slow_sma_margin)
            }
            Gate::VolatilityCompression => pass(ctx.range_pct()? <= th.max_range_pct),
            Gate::Overbought => pass(defined(snap.rsi)? <= th.max_rsi),
            Gate::Parabolic => pass(ctx.momentum_pct()? <= th.max_momentum_pct),
            Gate::Volume => {
                let avg = ctx.average_volume()?;
                pass(snap.volume >= avg * th.min_volume_ratio)
            }
            Gate::RiskCeiling => pass(ctx.risk_reward()?.risk_pct() <= th.max_risk_pct),
            Gate::Reward => pass(ctx.risk_reward()?.ratio_near >= th.min_reward_ratio),
            Gate::RelativeStrength => pass(ctx.relative_strength()?.passed),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.position(), self.name())
    }
}

/// Why a gate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateCause {
    /// Inputs were defined and the comparison failed.
    Threshold,
    /// A required indicator was NaN or missing.
    Undefined,
    /// A divisor was zero or negative (flat range, non-positive risk or base).
    Degenerate,
}

/// The first gate that failed, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateFailure {
    pub gate: Gate,
    pub cause: GateCause,
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self.cause {
            GateCause::Threshold => "threshold",
            GateCause::Undefined => "undefined input",
            GateCause::Degenerate => "degenerate input",
        };
        write!(f, "failed gate {} ({cause})", self.gate)
    }
}

fn defined(value: f64) -> Result<f64, GateCause> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GateCause::Undefined)
    }
}

fn positive(value: f64) -> Result<f64, GateCause> {
    let value = defined(value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(GateCause::Degenerate)
    }
}

fn pass(ok: bool) -> Result<(), GateCause> {
    if ok {
        Ok(())
    } else {
        Err(GateCause::Threshold)
    }
}

/// Everything a gate may look at for one instrument.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub series: &'a BarSeries,
    pub snapshot: &'a IndicatorSnapshot,
    pub benchmark: BenchmarkReturn,
    pub params: &'a ScreenParams,
}

impl<'a> GateContext<'a> {
    pub fn new(
        series: &'a BarSeries,
        snapshot: &'a IndicatorSnapshot,
        benchmark: BenchmarkReturn,
        params: &'a ScreenParams,
    ) -> Self {
        Self {
            series,
            snapshot,
            benchmark,
            params,
        }
    }

    /// Percent change from the momentum base close to the latest close.
    pub fn momentum_pct(&self) -> Result<f64, GateCause> {
        let close = defined(self.snapshot.close)?;
        let base = self
            .series
            .close_back(self.params.indicators.momentum_lookback)
            .ok_or(GateCause::Undefined)?;
        let base = positive(base)?;
        Ok((close - base) / base * 100.0)
    }

    /// Position of the close inside the recent range, 0 at the low and 1 at the high.
    pub fn range_position(&self) -> Result<f64, GateCause> {
        let close = defined(self.snapshot.close)?;
        let low = defined(self.snapshot.range_low)?;
        defined(self.snapshot.range_high)?;
        let range = positive(self.snapshot.range())?;
        Ok((close - low) / range)
    }

    /// Recent range as a percentage of the recent low.
    pub fn range_pct(&self) -> Result<f64, GateCause> {
        defined(self.snapshot.range_high)?;
        let low = positive(self.snapshot.range_low)?;
        Ok(self.snapshot.range() / low * 100.0)
    }

    /// Fractional distance of the close below the 52-period high.
    pub fn distance_from_high(&self) -> Result<f64, GateCause> {
        let close = defined(self.snapshot.close)?;
        let high = positive(self.snapshot.period_high)?;
        Ok((high - close) / high)
    }

    pub fn average_volume(&self) -> Result<f64, GateCause> {
        positive(self.snapshot.avg_volume)
    }

    pub fn volume_ratio(&self) -> Result<f64, GateCause> {
        Ok(self.snapshot.volume / self.average_volume()?)
    }

    pub fn risk_reward(&self) -> Result<RiskReward, GateCause> {
        let close = defined(self.snapshot.close)?;
        let low = defined(self.snapshot.range_low)?;
        RiskReward::compute(close, low, &self.params.thresholds).ok_or(GateCause::Degenerate)
    }

    pub fn relative_strength(&self) -> Result<RelativeStrength, GateCause> {
        let lookback = self.params.indicators.relative_strength_lookback;
        self.series
            .close_back(lookback)
            .ok_or(GateCause::Undefined)?;
        let stock_return = trailing_return(self.series, lookback).ok_or(GateCause::Degenerate)?;
        Ok(RelativeStrength::evaluate(
            stock_return,
            self.benchmark,
            self.params.thresholds.benchmark_margin,
        ))
    }
}

/// An ordering of all twelve gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateChain {
    order: Vec<Gate>,
}

impl GateChain {
    pub fn canonical() -> Self {
        Self {
            order: Gate::CANONICAL.to_vec(),
        }
    }

    /// A custom order. Returns `None` unless `order` holds every gate exactly once.
    pub fn with_order(order: Vec<Gate>) -> Option<Self> {
        let mut sorted = order.clone();
        sorted.sort();
        let mut canonical = Gate::CANONICAL.to_vec();
        canonical.sort();
        (sorted == canonical).then_some(Self { order })
    }

    pub fn gates(&self) -> &[Gate] {
        &self.order
    }

    /// Run the gates in order; the first failure ends the evaluation.
    pub fn run(&self, ctx: &GateContext<'_>) -> Result<(), GateFailure> {
        for &gate in &self.order {
            if let Err(cause) = gate.check(ctx) {
                tracing::trace!(
                    symbol = ctx.series.symbol(),
                    gate = gate.name(),
                    ?cause,
                    "gate rejected"
                );
                return Err(GateFailure { gate, cause });
            }
        }
        Ok(())
    }
}

impl Default for GateChain {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn with_context<R>(
        series: &BarSeries,
        params: &ScreenParams,
        benchmark: f64,
        f: impl FnOnce(&GateContext<'_>) -> R,
    ) -> R {
        let snapshot = IndicatorSnapshot::compute(series, &params.indicators).unwrap();
        let ctx = GateContext::new(
            series,
            &snapshot,
            BenchmarkReturn::new(benchmark).unwrap(),
            params,
        );
        f(&ctx)
    }

    #[test]
    fn positions_follow_canonical_order() {
        assert_eq!(Gate::Trend.position(), 1);
        assert_eq!(Gate::Parabolic.position(), 8);
        assert_eq!(Gate::RelativeStrength.position(), 12);
        assert_eq!(Gate::Reward.to_string(), "#11 reward");
    }

    #[test]
    fn setup_passes_every_gate_with_tight_stop() {
        let series = sample::swing_setup("SETUP");
        let params = sample::tight_stop_params();
        with_context(&series, &params, 0.02, |ctx| {
            for gate in Gate::CANONICAL {
                assert_eq!(gate.check(ctx), Ok(()), "{gate}");
            }
            assert!(GateChain::canonical().run(ctx).is_ok());
        });
    }

    #[test]
    fn default_stop_fails_risk_ceiling() {
        let series = sample::swing_setup("SETUP");
        let params = ScreenParams::default();
        with_context(&series, &params, 0.02, |ctx| {
            let failure = GateChain::canonical().run(ctx).unwrap_err();
            assert_eq!(failure.gate, Gate::RiskCeiling);
            assert_eq!(failure.cause, GateCause::Threshold);
        });
    }

    #[test]
    fn context_values() {
        let series = sample::swing_setup("SETUP");
        let params = sample::tight_stop_params();
        with_context(&series, &params, 0.02, |ctx| {
            let momentum = ctx.momentum_pct().unwrap();
            assert!((momentum - (100.0 - 97.5) / 97.5 * 100.0).abs() < 1e-9);
            let position = ctx.range_position().unwrap();
            assert!((position - 2.6 / 2.7).abs() < 1e-9);
            assert!((ctx.volume_ratio().unwrap() - 1.0).abs() < 1e-12);
            assert!(ctx.distance_from_high().unwrap() > 0.0);
        });
    }

    #[test]
    fn flat_range_is_degenerate_not_a_division() {
        let series = sample::flat_series("FLAT", 260, 50.0);
        let params = ScreenParams::default();
        with_context(&series, &params, 0.0, |ctx| {
            assert_eq!(ctx.snapshot.range(), 0.0);
            assert_eq!(
                Gate::BreakoutPosition.check(ctx),
                Err(GateCause::Degenerate)
            );
            // The compression gate reads a flat range as 0%.
            assert_eq!(Gate::VolatilityCompression.check(ctx), Ok(()));
            // Flat closes never clear the strict trend test.
            let failure = GateChain::canonical().run(ctx).unwrap_err();
            assert_eq!(failure.gate, Gate::Trend);
        });
    }

    #[test]
    fn undefined_rsi_is_rejected() {
        let series = sample::trending_series("UP", 260);
        let params = ScreenParams::default();
        with_context(&series, &params, 0.0, |ctx| {
            assert!(ctx.snapshot.rsi.is_nan());
            assert_eq!(Gate::Overbought.check(ctx), Err(GateCause::Undefined));
        });
    }

    #[test]
    fn with_order_requires_a_permutation() {
        let mut reversed = Gate::CANONICAL.to_vec();
        reversed.reverse();
        assert!(GateChain::with_order(reversed).is_some());
        assert!(GateChain::with_order(vec![Gate::Trend]).is_none());

        let mut doubled = Gate::CANONICAL.to_vec();
        doubled[11] = Gate::Trend;
        assert!(GateChain::with_order(doubled).is_none());
    }

    #[test]
    fn reversed_chain_reports_last_gate_first() {
        let series = sample::swing_setup("SETUP");
        let params = sample::tight_stop_params();
        // Benchmark far above the stock return: only relative strength fails.
        with_context(&series, &params, 0.5, |ctx| {
            let mut reversed = Gate::CANONICAL.to_vec();
            reversed.reverse();
            let chain = GateChain::with_order(reversed).unwrap();
            assert_eq!(chain.run(ctx).unwrap_err().gate, Gate::RelativeStrength);
            assert_eq!(
                GateChain::canonical().run(ctx).unwrap_err().gate,
                Gate::RelativeStrength
            );
        });
    }

    /// Snapshot that clears every snapshot-only gate under default thresholds.
    fn passing_snapshot(close: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            as_of: sample::trading_dates(1)[0],
            close,
            volume: 1_000.0,
            sma_fast: close * 0.95,
            sma_slow: close * 0.9,
            rsi: 60.0,
            range_high: close + 0.5,
            range_low: close - 2.5,
            period_high: close + 1.0,
            avg_volume: 1_000.0,
            bar_count: 260,
        }
    }

    /// Ten closes: `base` nine times, then `close`, so momentum reads `base -> close`.
    fn momentum_series(base: f64, close: f64) -> BarSeries {
        let mut closes = vec![base; 9];
        closes.push(close);
        sample::series_from_closes("EDGE", &closes, 0.1, 1_000)
    }

    fn check_with(
        gate: Gate,
        snapshot: &IndicatorSnapshot,
        series: &BarSeries,
    ) -> Result<(), GateCause> {
        let params = ScreenParams::default();
        let benchmark = BenchmarkReturn::new(0.0).unwrap();
        gate.check(&GateContext::new(series, snapshot, benchmark, &params))
    }

    fn check(gate: Gate, snapshot: &IndicatorSnapshot) -> Result<(), GateCause> {
        check_with(gate, snapshot, &momentum_series(100.0, snapshot.close))
    }

    #[test]
    fn momentum_floor_is_inclusive() {
        let at = momentum_series(100.0, 102.0);
        assert_eq!(check_with(Gate::Momentum, &passing_snapshot(102.0), &at), Ok(()));
        let below = momentum_series(100.0, 101.9);
        assert_eq!(
            check_with(Gate::Momentum, &passing_snapshot(101.9), &below),
            Err(GateCause::Threshold)
        );
    }

    #[test]
    fn parabolic_cap_is_inclusive() {
        let at = momentum_series(100.0, 118.0);
        assert_eq!(check_with(Gate::Parabolic, &passing_snapshot(118.0), &at), Ok(()));
        let above = momentum_series(100.0, 118.1);
        assert_eq!(
            check_with(Gate::Parabolic, &passing_snapshot(118.1), &above),
            Err(GateCause::Threshold)
        );
    }

    #[test]
    fn momentum_base_must_be_positive() {
        let series = momentum_series(0.0, 5.0);
        assert_eq!(
            check_with(Gate::Momentum, &passing_snapshot(5.0), &series),
            Err(GateCause::Degenerate)
        );
    }

    #[test]
    fn proximity_to_high_allows_exactly_25_pct() {
        let mut snap = passing_snapshot(75.0);
        snap.period_high = 100.0;
        assert_eq!(check(Gate::ProximityToHigh, &snap), Ok(()));
        snap.close = 74.9;
        assert_eq!(check(Gate::ProximityToHigh, &snap), Err(GateCause::Threshold));
        snap.period_high = f64::NAN;
        assert_eq!(check(Gate::ProximityToHigh, &snap), Err(GateCause::Undefined));
    }

    #[test]
    fn long_term_trend_needs_two_pct_over_slow_sma() {
        let mut snap = passing_snapshot(102.0);
        snap.sma_slow = 100.0;
        assert_eq!(check(Gate::LongTermTrend, &snap), Ok(()));
        snap.close = 101.99;
        assert_eq!(check(Gate::LongTermTrend, &snap), Err(GateCause::Threshold));
        snap.sma_slow = f64::NAN;
        assert_eq!(check(Gate::LongTermTrend, &snap), Err(GateCause::Undefined));
    }

    #[test]
    fn compression_allows_exactly_12_pct() {
        let mut snap = passing_snapshot(111.0);
        snap.range_low = 100.0;
        snap.range_high = 112.0;
        assert_eq!(check(Gate::VolatilityCompression, &snap), Ok(()));
        snap.range_high = 112.1;
        assert_eq!(check(Gate::VolatilityCompression, &snap), Err(GateCause::Threshold));
        snap.range_low = 0.0;
        assert_eq!(check(Gate::VolatilityCompression, &snap), Err(GateCause::Degenerate));
    }

    #[test]
    fn overbought_line_is_inclusive() {
        let mut snap = passing_snapshot(100.0);
        snap.rsi = 70.0;
        assert_eq!(check(Gate::Overbought, &snap), Ok(()));
        snap.rsi = 70.0001;
        assert_eq!(check(Gate::Overbought, &snap), Err(GateCause::Threshold));
    }

    #[test]
    fn volume_floor_is_inclusive() {
        let mut snap = passing_snapshot(100.0);
        snap.avg_volume = 1_000.0;
        snap.volume = 800.0;
        assert_eq!(check(Gate::Volume, &snap), Ok(()));
        snap.volume = 799.0;
        assert_eq!(check(Gate::Volume, &snap), Err(GateCause::Threshold));
        snap.avg_volume = 0.0;
        assert_eq!(check(Gate::Volume, &snap), Err(GateCause::Degenerate));
    }

    #[test]
    fn trend_is_strict() {
        let mut snap = passing_snapshot(100.0);
        snap.sma_fast = 100.0;
        assert_eq!(check(Gate::Trend, &snap), Err(GateCause::Threshold));
        snap.sma_fast = 99.99;
        assert_eq!(check(Gate::Trend, &snap), Ok(()));
    }
}
