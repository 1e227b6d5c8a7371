//! Exchange rate provider abstractions

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of a single provider fetch. None of these reach callers of the
/// resolver; they are reported through [`crate::core::events::RateObserver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Provider unreachable for {base}: {reason}")]
    ProviderUnreachable { base: String, reason: String },

    #[error("Invalid provider response for {base}: {reason}")]
    InvalidResponse { base: String, reason: String },

    #[error("No rate found for {base}/{target}")]
    RateNotFound { base: String, target: String },
}

impl FetchError {
    /// Short stable name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::ProviderUnreachable { .. } => "provider_unreachable",
            FetchError::InvalidResponse { .. } => "invalid_response",
            FetchError::RateNotFound { .. } => "rate_not_found",
        }
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the rate for one `base` unit expressed in `target`.
    /// Codes are already normalized to uppercase.
    async fn fetch_rate(&self, base: &str, target: &str) -> Result<Decimal, FetchError>;
}
