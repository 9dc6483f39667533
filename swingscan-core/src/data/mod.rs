//! Market data: bar providers and universe sources.

pub mod circuit_breaker;
pub mod csv_dir;
pub mod nse;
pub mod provider;
pub mod synthetic;
pub mod throttle;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_dir::CsvDirProvider;
pub use nse::NseUniverseProvider;
pub use provider::{DataError, DataProvider, UniverseProvider};
pub use synthetic::SyntheticProvider;
pub use throttle::ThrottledProvider;
pub use universe::{filter_listing_symbols, FileUniverse, Universe};
pub use yahoo::YahooProvider;
