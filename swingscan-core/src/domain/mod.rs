//! Domain types for the swing screen.

pub mod bar;
pub mod signal;

pub use bar::{Bar, BarError, BarSeries};
pub use signal::{PriceBand, RewardRatios, SignalRecord};

/// Instrument identifier as listed by the exchange (no provider suffix).
pub type Symbol = String;
