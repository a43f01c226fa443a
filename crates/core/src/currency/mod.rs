//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod exchange;

pub use conversion::convert_to_base;
pub use exchange::{ExchangeRate, RateSource, ResolvedRate, resolve_rate};
