use crate::core::config::ProviderConfig;
use crate::core::provider::{FetchError, RateProvider};
use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Client for exchangerate-api.com style endpoints: `GET {api_url}{BASE}`
/// returning `{"rates": {"EUR": 0.92, ...}}`.
pub struct ExchangeRateApiProvider {
    api_url: String,
    rates_field: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxcache/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_url: config.api_url.clone(),
            rates_field: config.rates_field.clone(),
            client,
        })
    }

    fn unreachable(base: &str, reason: impl Into<String>) -> FetchError {
        FetchError::ProviderUnreachable {
            base: base.to_string(),
            reason: reason.into(),
        }
    }

    fn invalid(base: &str, reason: impl Into<String>) -> FetchError {
        FetchError::InvalidResponse {
            base: base.to_string(),
            reason: reason.into(),
        }
    }

    /// Pulls the target's rate out of a response body without going through f64.
    fn extract_rate(&self, body: &str, base: &str, target: &str) -> Result<Decimal, FetchError> {
        let data: Value = serde_json::from_str(body)
            .map_err(|e| Self::invalid(base, format!("Failed to parse JSON response: {e}")))?;

        let rates = data
            .get(&self.rates_field)
            .and_then(Value::as_object)
            .ok_or_else(|| Self::invalid(base, format!("Missing '{}' object", self.rates_field)))?;

        let value = rates.get(target).ok_or_else(|| FetchError::RateNotFound {
            base: base.to_string(),
            target: target.to_string(),
        })?;

        let number = match value {
            Value::Number(n) => n.to_string(),
            other => {
                return Err(Self::invalid(
                    base,
                    format!("Rate for {target} is not a number: {other}"),
                ));
            }
        };

        let rate = Decimal::from_str(&number)
            .or_else(|_| Decimal::from_scientific(&number))
            .map_err(|e| Self::invalid(base, format!("Rate for {target} is not a decimal: {e}")))?;

        if rate.is_sign_negative() {
            return Err(Self::invalid(
                base,
                format!("Rate for {target} is negative: {rate}"),
            ));
        }
        Ok(rate)
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateApiFetch", skip(self))]
    async fn fetch_rate(&self, base: &str, target: &str) -> Result<Decimal, FetchError> {
        let url = format!("{}{}", self.api_url, base);
        debug!("Requesting exchange rates from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                Self::unreachable(base, format!("Request timed out: {e}"))
            } else {
                Self::unreachable(base, format!("Request error: {e}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::unreachable(
                base,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::unreachable(base, format!("Failed to read response body: {e}")))?;

        let rate = self.extract_rate(&body, base, target)?;
        debug!(%rate, "Received rate");
        Ok(rate)
    }
}
