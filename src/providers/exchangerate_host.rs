use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyRateProvider, FetchError};
use crate::core::rate::RateDate;

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate.host";

// ExchangeRateHostProvider implementation for CurrencyRateProvider
pub struct ExchangeRateHostProvider {
    base_url: String,
    access_key: Option<String>,
    client: reqwest::Client,
}

impl ExchangeRateHostProvider {
    pub fn new(base_url: &str, access_key: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("ratecache/0.1")
            .build()?;
        Ok(ExchangeRateHostProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
            client,
        })
    }

    fn rate_url(&self, date: RateDate) -> String {
        format!("{}/{date}", self.base_url)
    }

    fn query_params<'a>(&'a self, from: &'a str, to: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("base", from), ("symbols", to)];
        if let Some(key) = &self.access_key {
            params.push(("access_key", key.as_str()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    success: Option<bool>,
    error: Option<ProviderErrorBody>,
    rates: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    info: Option<String>,
}

fn extract_rate(data: RatesResponse, to: &str) -> Result<f64, FetchError> {
    if data.success != Some(true) {
        if let Some(error) = data.error {
            return Err(FetchError::Provider(
                error.info.unwrap_or_else(|| "API error".to_string()),
            ));
        }
    }

    data.rates
        .as_ref()
        .and_then(|rates| rates.get(to))
        .and_then(serde_json::Value::as_f64)
        .filter(|rate| *rate > 0.0)
        .ok_or_else(|| FetchError::Parse(format!("Invalid rate data for {to}")))
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateHostProvider {
    #[instrument(
        name = "ExchangeRateFetch",
        skip_all,
        fields(from = %from, to = %to, date = %date)
    )]
    async fn fetch_rate(&self, from: &str, to: &str, date: RateDate) -> Result<f64, FetchError> {
        let url = self.rate_url(date);
        debug!("Requesting exchange rate from {url}");

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(from, to))
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request error: {e} for pair: {from}{to}")))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error: {} for pair: {from}{to}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let data: RatesResponse = serde_json::from_str(&text).map_err(|e| {
            FetchError::Parse(format!("Failed to parse JSON response for {from}{to}: {e}"))
        })?;

        extract_rate(data, to)
    }
}
