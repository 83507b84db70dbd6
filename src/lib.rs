pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{ConversionItem, RateConverter};
use crate::providers::ExchangeRateHostProvider;
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rate {
        from: String,
        to: String,
        date: Option<NaiveDate>,
    },
    Convert {
        amount: f64,
        from: String,
        to: Option<String>,
        date: Option<NaiveDate>,
        locale: Option<String>,
    },
    ConvertMany {
        items: Vec<ConversionItem>,
        to: Option<String>,
        date: Option<NaiveDate>,
        locale: Option<String>,
    },
    Preload {
        currencies: Vec<String>,
        base: Option<String>,
    },
    ClearCache,
}

/// Wires the provider, the persisted tier and the converter from `config`.
pub fn build_converter(config: &AppConfig) -> Result<RateConverter> {
    let latest_ttl = config.latest_ttl()?;
    let provider = ExchangeRateHostProvider::new(config.base_url(), config.access_key())?;
    let store = store::open_store(config);

    Ok(RateConverter::new(Arc::new(provider))
        .with_store(store)
        .with_latest_ttl(latest_ttl))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rate cache starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let converter = build_converter(&config)?;

    match command {
        AppCommand::Rate { from, to, date } => {
            cli::rates::show_rate(&converter, &from, &to, date).await
        }
        AppCommand::Convert {
            amount,
            from,
            to,
            date,
            locale,
        } => {
            let to = to.unwrap_or_else(|| config.currency.clone());
            let locale = locale.unwrap_or_else(|| config.locale.clone());
            cli::rates::show_conversion(&converter, amount, &from, &to, date, &locale).await
        }
        AppCommand::ConvertMany {
            items,
            to,
            date,
            locale,
        } => {
            let to = to.unwrap_or_else(|| config.currency.clone());
            let locale = locale.unwrap_or_else(|| config.locale.clone());
            cli::rates::show_conversions(&converter, &items, &to, date, &locale).await
        }
        AppCommand::Preload { currencies, base } => {
            let base = base.unwrap_or_else(|| config.currency.clone());
            cli::rates::preload(&converter, &currencies, &base).await
        }
        AppCommand::ClearCache => cli::rates::clear_cache(&converter).await,
    }
}
