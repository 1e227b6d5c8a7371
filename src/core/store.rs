//! Storage abstraction for cached exchange rates

use super::rate::{CurrencyPair, RateEntry};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("Failed to encode or decode rate entry: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Rate store unavailable: {0}")]
    Unavailable(String),
}

/// Durable cache of the last fetched rate per currency pair.
///
/// Implementations must tolerate concurrent `put` calls for the same pair;
/// the last writer wins and an entry is never left half-written.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn get(&self, pair: &CurrencyPair) -> Result<Option<RateEntry>, StoreError>;

    /// Inserts or replaces the entry for `entry`'s pair.
    async fn put(&self, entry: RateEntry) -> Result<(), StoreError>;

    /// Removes the entry for `pair`. Missing entries are not an error.
    async fn evict(&self, pair: &CurrencyPair) -> Result<(), StoreError>;
}
