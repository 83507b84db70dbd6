use crate::core::rate::LATEST_RATE_TTL_HOURS;
use crate::providers::exchangerate_host::DEFAULT_BASE_URL;
use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateHostConfig {
    pub base_url: String,
    #[serde(default)]
    pub access_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub exchangerate_host: Option<ExchangeRateHostConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchangerate_host: Some(ExchangeRateHostConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                access_key: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_persist")]
    pub persist: bool,
    #[serde(default = "default_latest_ttl_hours")]
    pub latest_ttl_hours: i64,
}

fn default_persist() -> bool {
    true
}

fn default_latest_ttl_hours() -> i64 {
    LATEST_RATE_TTL_HOURS
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            persist: default_persist(),
            latest_ttl_hours: default_latest_ttl_hours(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            locale: default_locale(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "ratecache", "ratecache")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "ratecache", "ratecache")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        self.providers
            .exchangerate_host
            .as_ref()
            .map_or(DEFAULT_BASE_URL, |p| &p.base_url)
    }

    /// How long a cached `latest` rate stays valid. Must be a positive number of hours.
    pub fn latest_ttl(&self) -> Result<TimeDelta> {
        let hours = self.cache.latest_ttl_hours;
        if hours <= 0 {
            bail!("Invalid cache.latest_ttl_hours: {hours}, expected a positive number of hours");
        }
        TimeDelta::try_hours(hours)
            .with_context(|| format!("Invalid cache.latest_ttl_hours: {hours} is out of range"))
    }

    pub fn access_key(&self) -> Option<String> {
        self.providers
            .exchangerate_host
            .as_ref()
            .and_then(|p| p.access_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "EUR"
locale: "de-DE"
data_path: "/tmp/ratecache"
providers:
  exchangerate_host:
    base_url: "http://example.com/rates"
    access_key: "abc123"
cache:
  persist: false
  latest_ttl_hours: 6
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.locale, "de-DE");
        assert_eq!(config.data_path.as_deref(), Some("/tmp/ratecache"));
        assert_eq!(config.base_url(), "http://example.com/rates");
        assert_eq!(config.access_key().as_deref(), Some("abc123"));
        assert!(!config.cache.persist);
        assert_eq!(config.cache.latest_ttl_hours, 6);
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("currency: \"GBP\"\n").unwrap();

        assert_eq!(config.currency, "GBP");
        assert_eq!(config.locale, "en-US");
        assert_eq!(config.base_url(), "https://api.exchangerate.host");
        assert!(config.access_key().is_none());
        assert!(config.cache.persist);
        assert_eq!(config.cache.latest_ttl_hours, 24);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_partial_cache_section() {
        let yaml_str = r#"
cache:
  latest_ttl_hours: 12
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert!(config.cache.persist);
        assert_eq!(config.cache.latest_ttl_hours, 12);
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_latest_ttl() {
        let config: AppConfig = serde_yaml::from_str("cache:\n  latest_ttl_hours: 6\n").unwrap();
        assert_eq!(config.latest_ttl().unwrap(), TimeDelta::hours(6));
        assert_eq!(AppConfig::default().latest_ttl().unwrap(), TimeDelta::hours(24));
    }

    #[test]
    fn test_latest_ttl_rejects_non_positive_hours() {
        for hours in [0, -5] {
            let config: AppConfig =
                serde_yaml::from_str(&format!("cache:\n  latest_ttl_hours: {hours}\n")).unwrap();
            let err = config.latest_ttl().unwrap_err();
            assert!(err.to_string().contains("Invalid cache.latest_ttl_hours"));
        }
    }

    #[test]
    fn test_latest_ttl_rejects_out_of_range_hours() {
        let config: AppConfig =
            serde_yaml::from_str("cache:\n  latest_ttl_hours: 9223372036854775807\n").unwrap();
        let err = config.latest_ttl().unwrap_err();
        assert!(err.to_string().contains("Invalid cache.latest_ttl_hours"));
        assert!(crate::build_converter(&config).is_err());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/definitely/not/here/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
