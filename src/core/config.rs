use super::rate::normalize_code;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/";

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_ticker_currencies() -> Vec<String> {
    vec!["USD".to_string(), "AED".to_string(), "INR".to_string()]
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_rates_field() -> String {
    "rates".to_string()
}

fn default_cache_duration_hours() -> u64 {
    24
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_persist() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CurrencyConfig {
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_ticker_currencies")]
    pub ticker_currencies: Vec<String>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            ticker_currencies: default_ticker_currencies(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExchangeRatesConfig {
    /// The base currency code is appended to this to form the request URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Name of the JSON field holding the code to rate map.
    #[serde(default = "default_rates_field")]
    pub rates_field: String,
    #[serde(default = "default_cache_duration_hours")]
    pub cache_duration_hours: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExchangeRatesConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            rates_field: default_rates_field(),
            cache_duration_hours: default_cache_duration_hours(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Keep rates on disk across runs. In-memory otherwise.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub exchange_rates: ExchangeRatesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub data_path: Option<String>,
}

/// Settings consumed by [`crate::resolver::RateResolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub base_currency: String,
    pub ticker_currencies: Vec<String>,
    pub ttl: chrono::Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            ticker_currencies: default_ticker_currencies(),
            ttl: chrono::Duration::hours(default_cache_duration_hours() as i64),
        }
    }
}

/// Settings consumed by [`crate::providers::exchangerate_api::ExchangeRateApiProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_url: String,
    pub rates_field: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            rates_field: default_rates_field(),
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "moneywise", "fxcache")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if normalize_code(&self.currency.base_currency).is_empty() {
            bail!("currency.base_currency must not be empty");
        }
        if self.exchange_rates.api_url.trim().is_empty() {
            bail!("exchange_rates.api_url must not be empty");
        }
        if self.exchange_rates.timeout_secs == 0 {
            bail!("exchange_rates.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            base_currency: normalize_code(&self.currency.base_currency),
            ticker_currencies: self
                .currency
                .ticker_currencies
                .iter()
                .map(|c| normalize_code(c))
                .collect(),
            ttl: i64::try_from(self.exchange_rates.cache_duration_hours)
                .ok()
                .and_then(chrono::Duration::try_hours)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_url: self.exchange_rates.api_url.clone(),
            rates_field: self.exchange_rates.rates_field.clone(),
            timeout: Duration::from_secs(self.exchange_rates.timeout_secs),
        }
    }
}
