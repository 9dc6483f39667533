//! Screening components: the indicator trait and the gate chain.
//!
//! Indicators turn a bar series into numeric series. Gates read the latest
//! indicator values and either pass or name the reason they failed.

pub mod gate;
pub mod indicator;

pub use gate::{Gate, GateCause, GateChain, GateContext, GateFailure};
pub use indicator::Indicator;
