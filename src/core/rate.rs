//! Exchange rate types and cache addressing

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Reserved prefix shared by every cached rate key.
pub const CACHE_KEY_PREFIX: &str = "exchange_rate_";

/// How long a `latest` rate stays usable after it was fetched.
pub const LATEST_RATE_TTL_HOURS: i64 = 24;

/// Which rate is being asked for: the current one or a historical snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateDate {
    Latest,
    On(NaiveDate),
}

impl RateDate {
    pub fn is_historical(&self) -> bool {
        matches!(self, RateDate::On(_))
    }
}

impl From<Option<NaiveDate>> for RateDate {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(RateDate::Latest, RateDate::On)
    }
}

impl Display for RateDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateDate::Latest => write!(f, "latest"),
            RateDate::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Builds the composite key `exchange_rate_{from}_{to}_{date-or-latest}`.
pub fn cache_key(from: &str, to: &str, date: RateDate) -> String {
    format!("{CACHE_KEY_PREFIX}{from}_{to}_{date}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Historical rates never expire; latest ones live for `ttl` after `fetched_at`.
    pub fn is_valid(&self, date: RateDate, now: DateTime<Utc>, ttl: Duration) -> bool {
        date.is_historical() || now - self.fetched_at < ttl
    }
}

/// Result of a single conversion. Derived on every call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedAmount {
    pub original_amount: f64,
    pub original_currency: String,
    pub converted_amount: f64,
    pub target_currency: String,
    pub exchange_rate: f64,
    pub rate_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConversionItem {
    pub amount: f64,
    pub currency: String,
}

impl ConversionItem {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rate_fetched_at(fetched_at: DateTime<Utc>) -> ExchangeRate {
        ExchangeRate {
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            rate: 0.92,
            fetched_at,
        }
    }

    #[test]
    fn test_cache_key_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            cache_key("USD", "EUR", RateDate::On(date)),
            "exchange_rate_USD_EUR_2024-03-05"
        );
        assert_eq!(
            cache_key("USD", "EUR", RateDate::Latest),
            "exchange_rate_USD_EUR_latest"
        );
    }

    #[test]
    fn test_latest_expires_after_ttl() {
        let fetched_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let rate = rate_fetched_at(fetched_at);
        let ttl = Duration::hours(LATEST_RATE_TTL_HOURS);

        assert!(rate.is_valid(RateDate::Latest, fetched_at + Duration::hours(23), ttl));
        assert!(!rate.is_valid(RateDate::Latest, fetched_at + ttl, ttl));
    }

    #[test]
    fn test_historical_never_expires() {
        let fetched_at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let rate = rate_fetched_at(fetched_at);
        let date = RateDate::On(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());

        assert!(rate.is_valid(
            date,
            fetched_at + Duration::days(3650),
            Duration::hours(LATEST_RATE_TTL_HOURS)
        ));
    }

    #[test]
    fn test_persisted_json_shape() {
        let fetched_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(rate_fetched_at(fetched_at)).unwrap();

        assert_eq!(json["fromCurrency"], "USD");
        assert_eq!(json["toCurrency"], "EUR");
        assert_eq!(json["rate"], 0.92);
        assert_eq!(json["fetchedAt"], "2024-01-01T12:00:00Z");
    }
}
