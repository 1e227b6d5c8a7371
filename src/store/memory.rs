use crate::core::rate::{CurrencyPair, RateEntry};
use crate::core::store::{RateStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory rate store, lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryRateStore {
    inner: Arc<Mutex<HashMap<CurrencyPair, RateEntry>>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn get(&self, pair: &CurrencyPair) -> Result<Option<RateEntry>, StoreError> {
        let rates = self.inner.lock().await;
        let entry = rates.get(pair).cloned();
        if entry.is_some() {
            debug!("Store HIT for pair: {}", pair);
        } else {
            debug!("Store MISS for pair: {}", pair);
        }
        Ok(entry)
    }

    async fn put(&self, entry: RateEntry) -> Result<(), StoreError> {
        let pair = entry.pair();
        let mut rates = self.inner.lock().await;
        debug!("Store PUT for pair: {}", pair);
        rates.insert(pair, entry);
        Ok(())
    }

    async fn evict(&self, pair: &CurrencyPair) -> Result<(), StoreError> {
        let mut rates = self.inner.lock().await;
        rates.remove(pair);
        debug!("Store REMOVE for pair: {}", pair);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_store_get_put() {
        let store = MemoryRateStore::new();
        let pair = CurrencyPair::new("USD", "EUR");

        // Initially, store is empty
        assert!(store.get(&pair).await.unwrap().is_none());

        let entry = RateEntry::new(&pair, dec!(0.92), Utc::now());
        store.put(entry.clone()).await.unwrap();
        assert_eq!(store.get(&pair).await.unwrap(), Some(entry));

        // The reverse direction is a different entry
        assert!(
            store
                .get(&CurrencyPair::new("EUR", "USD"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_store_put_overwrites() {
        let store = MemoryRateStore::new();
        let pair = CurrencyPair::new("USD", "INR");
        let earlier = Utc::now() - Duration::days(2);

        store
            .put(RateEntry::new(&pair, dec!(82.5), earlier))
            .await
            .unwrap();
        let latest = RateEntry::new(&pair, dec!(83.1), Utc::now());
        store.put(latest.clone()).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&pair).await.unwrap(), Some(latest));
    }

    #[tokio::test]
    async fn test_store_evict() {
        let store = MemoryRateStore::new();
        let pair = CurrencyPair::new("USD", "AED");

        // Evicting a missing entry is fine
        store.evict(&pair).await.unwrap();

        store
            .put(RateEntry::new(&pair, dec!(3.6725), Utc::now()))
            .await
            .unwrap();
        store.evict(&pair).await.unwrap();
        assert!(store.get(&pair).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
