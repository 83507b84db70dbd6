//! Currency rate source abstractions

use crate::core::rate::RateDate;
use async_trait::async_trait;
use thiserror::Error;

/// Why a remote rate lookup failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Fetches the `from -> to` rate for `date` straight from the source, no caching.
    async fn fetch_rate(&self, from: &str, to: &str, date: RateDate) -> Result<f64, FetchError>;
}
