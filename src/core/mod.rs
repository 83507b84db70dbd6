//! Core rate lookup, caching and conversion

pub mod cache;
pub mod clock;
pub mod config;
pub mod converter;
pub mod currency;
pub mod format;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use cache::RateStore;
pub use clock::{Clock, SystemClock};
pub use converter::{DEFAULT_RATE, RateConverter};
pub use currency::{CurrencyRateProvider, FetchError};
pub use rate::{ConversionItem, ConvertedAmount, ExchangeRate, RateDate};
