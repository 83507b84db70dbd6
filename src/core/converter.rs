//! Two-tier cached rate lookup and amount conversion.
//!
//! Lookups go memory tier, then the persisted tier (when one is configured),
//! then the remote provider. A failed historical lookup falls back to the
//! latest rate for the same pair before giving up.

use crate::core::cache::{Cache, RateStore};
use crate::core::clock::{Clock, SystemClock};
use crate::core::currency::{CurrencyRateProvider, FetchError};
use crate::core::rate::{
    CACHE_KEY_PREFIX, ConversionItem, ConvertedAmount, ExchangeRate, LATEST_RATE_TTL_HOURS,
    RateDate, cache_key,
};
use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Multiplier handed out by [`RateConverter::get_rate`] when no rate could be found.
pub const DEFAULT_RATE: f64 = 1.0;

#[derive(Clone)]
pub struct RateConverter {
    provider: Arc<dyn CurrencyRateProvider>,
    memory: Cache<String, ExchangeRate>,
    store: Option<Arc<dyn RateStore>>,
    clock: Arc<dyn Clock>,
    latest_ttl: Duration,
}

impl RateConverter {
    pub fn new(provider: Arc<dyn CurrencyRateProvider>) -> Self {
        Self {
            provider,
            memory: Cache::new(),
            store: None,
            clock: Arc::new(SystemClock),
            latest_ttl: Duration::hours(LATEST_RATE_TTL_HOURS),
        }
    }

    pub fn with_store(mut self, store: Option<Arc<dyn RateStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_latest_ttl(mut self, ttl: Duration) -> Self {
        self.latest_ttl = ttl;
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Returns the rate, or [`DEFAULT_RATE`] when every source failed.
    ///
    /// A result of `1.0` is therefore ambiguous; use [`Self::try_get_rate`]
    /// where parity and failure must be told apart.
    pub async fn get_rate(&self, from: &str, to: &str, date: Option<NaiveDate>) -> f64 {
        self.try_get_rate(from, to, date).await.unwrap_or_else(|| {
            debug!(%from, %to, "Using default rate");
            DEFAULT_RATE
        })
    }

    #[instrument(name = "RateLookup", skip(self))]
    pub async fn try_get_rate(&self, from: &str, to: &str, date: Option<NaiveDate>) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }

        let date = RateDate::from(date);
        if let Some(cached) = self.cached_rate(from, to, date).await {
            return Some(cached.rate);
        }

        match self.fetch_and_store(from, to, date).await {
            Ok(rate) => Some(rate),
            Err(err) => {
                warn!(error = %err, "Failed to fetch exchange rate");
                if date.is_historical() {
                    self.fallback_to_latest(from, to).await
                } else {
                    None
                }
            }
        }
    }

    pub async fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
        date: Option<NaiveDate>,
    ) -> ConvertedAmount {
        let rate = self.get_rate(from, to, date).await;
        self.converted(amount, from, to, rate, date)
    }

    /// Like [`Self::convert`], but `None` when the rate is unknown.
    pub async fn try_convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
        date: Option<NaiveDate>,
    ) -> Option<ConvertedAmount> {
        let rate = self.try_get_rate(from, to, date).await?;
        Some(self.converted(amount, from, to, rate, date))
    }

    /// Converts every item into `target`, resolving each distinct source
    /// currency once and concurrently. Output order matches `items`.
    pub async fn convert_many(
        &self,
        items: &[ConversionItem],
        target: &str,
        date: Option<NaiveDate>,
    ) -> Vec<ConvertedAmount> {
        let rates = self.resolve_rates(items, target, date).await;
        items
            .iter()
            .map(|item| {
                let rate = rates
                    .get(item.currency.as_str())
                    .copied()
                    .flatten()
                    .unwrap_or(DEFAULT_RATE);
                self.converted(item.amount, &item.currency, target, rate, date)
            })
            .collect()
    }

    pub async fn try_convert_many(
        &self,
        items: &[ConversionItem],
        target: &str,
        date: Option<NaiveDate>,
    ) -> Vec<Option<ConvertedAmount>> {
        let rates = self.resolve_rates(items, target, date).await;
        items
            .iter()
            .map(|item| {
                let rate = rates.get(item.currency.as_str()).copied().flatten()?;
                Some(self.converted(item.amount, &item.currency, target, rate, date))
            })
            .collect()
    }

    async fn resolve_rates<'a>(
        &self,
        items: &'a [ConversionItem],
        target: &str,
        date: Option<NaiveDate>,
    ) -> HashMap<&'a str, Option<f64>> {
        let currencies: BTreeSet<&str> = items.iter().map(|i| i.currency.as_str()).collect();
        debug!(
            items = items.len(),
            currencies = currencies.len(),
            "Prefetching rates"
        );

        let rate_futures = currencies.into_iter().map(|currency| async move {
            (currency, self.try_get_rate(currency, target, date).await)
        });
        join_all(rate_futures).await.into_iter().collect()
    }

    /// Drops the memory tier and every persisted key under the rate prefix.
    pub async fn clear_cache(&self) {
        self.memory.clear().await;
        if let Some(store) = &self.store {
            let removed = store.remove_prefix(CACHE_KEY_PREFIX).await;
            info!(removed, "Cleared persisted exchange rates");
        }
    }

    pub async fn preload_rates(&self, currencies: &[String], base: &str) {
        self.preload_rates_with_progress(currencies, base, &|| {})
            .await;
    }

    /// Warms `currency -> base` latest rates. Failures are logged and skipped;
    /// returns how many rates are now known.
    pub async fn preload_rates_with_progress(
        &self,
        currencies: &[String],
        base: &str,
        on_progress: &(dyn Fn() + Sync),
    ) -> usize {
        let preload_futures = currencies
            .iter()
            .filter(|currency| currency.as_str() != base)
            .map(|currency| async move {
                let rate = self.try_get_rate(currency, base, None).await;
                on_progress();
                if rate.is_none() {
                    debug!(%currency, %base, "Skipping rate that failed to preload");
                }
                rate.is_some()
            });

        let loaded = join_all(preload_futures)
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();
        info!(loaded, %base, "Preloaded exchange rates");
        loaded
    }

    fn converted(
        &self,
        amount: f64,
        from: &str,
        to: &str,
        rate: f64,
        date: Option<NaiveDate>,
    ) -> ConvertedAmount {
        ConvertedAmount {
            original_amount: amount,
            original_currency: from.to_string(),
            converted_amount: amount * rate,
            target_currency: to.to_string(),
            exchange_rate: rate,
            rate_date: date.unwrap_or_else(|| self.clock.now().date_naive()),
        }
    }

    async fn cached_rate(&self, from: &str, to: &str, date: RateDate) -> Option<ExchangeRate> {
        let key = cache_key(from, to, date);
        let now = self.clock.now();

        if let Some(cached) = self.memory.get(&key).await {
            if cached.is_valid(date, now, self.latest_ttl) {
                return Some(cached);
            }
            debug!(%key, "In-memory rate expired");
        }

        let store = self.store.as_ref()?;
        let raw = store.get(&key).await?;
        match serde_json::from_str::<ExchangeRate>(&raw) {
            Ok(rate) if rate.is_valid(date, now, self.latest_ttl) => {
                debug!(%key, "Promoting persisted rate");
                self.memory.put(key, rate.clone()).await;
                Some(rate)
            }
            Ok(_) => {
                debug!(%key, "Persisted rate expired");
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "Ignoring unreadable persisted rate");
                None
            }
        }
    }

    async fn fetch_and_store(&self, from: &str, to: &str, date: RateDate) -> Result<f64, FetchError> {
        let rate = self.provider.fetch_rate(from, to, date).await?;
        let key = cache_key(from, to, date);
        let entry = ExchangeRate {
            from_currency: from.to_string(),
            to_currency: to.to_string(),
            rate,
            fetched_at: self.clock.now(),
        };

        if let Some(store) = &self.store {
            match serde_json::to_string(&entry) {
                Ok(json) => store.put(&key, &json).await,
                Err(e) => warn!(%key, error = %e, "Failed to serialize rate"),
            }
        }
        self.memory.put(key, entry).await;
        Ok(rate)
    }

    async fn fallback_to_latest(&self, from: &str, to: &str) -> Option<f64> {
        if let Some(cached) = self.cached_rate(from, to, RateDate::Latest).await {
            debug!("Falling back to cached latest rate");
            return Some(cached.rate);
        }

        match self.fetch_and_store(from, to, RateDate::Latest).await {
            Ok(rate) => {
                debug!("Falling back to freshly fetched latest rate");
                Some(rate)
            }
            Err(err) => {
                warn!(error = %err, "Fallback to latest rate also failed");
                None
            }
        }
    }
}
