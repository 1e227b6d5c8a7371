use crate::core::rate::{CurrencyPair, RateEntry};
use crate::core::store::{RateStore, StoreError};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION_NAME: &str = "exchange_rates";

/// Rate store backed by a fjall partition. Keys are `BASE/TARGET`, values are
/// JSON encoded [`RateEntry`] with the rate kept as a decimal string.
pub struct DiskRateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;

        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition(PARTITION_NAME, PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.partition.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.partition.is_empty()?)
    }

    /// Flushes the journal to disk off the async workers.
    async fn sync(&self) -> Result<(), StoreError> {
        let keyspace = self.keyspace.clone();
        tokio::task::spawn_blocking(move || keyspace.persist(PersistMode::SyncData))
            .await
            .map_err(|e| StoreError::Unavailable(format!("Journal sync task failed: {e}")))??;
        Ok(())
    }
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn get(&self, pair: &CurrencyPair) -> Result<Option<RateEntry>, StoreError> {
        match self.partition.get(pair.storage_key())? {
            Some(bytes) => {
                let entry: RateEntry = serde_json::from_slice(&bytes)?;
                debug!("Store HIT for pair: {}", pair);
                Ok(Some(entry))
            }
            None => {
                debug!("Store MISS for pair: {}", pair);
                Ok(None)
            }
        }
    }

    async fn put(&self, entry: RateEntry) -> Result<(), StoreError> {
        let key = entry.pair().storage_key();
        let value = serde_json::to_vec(&entry)?;
        // A single insert replaces rate and timestamp together
        self.partition.insert(key.as_str(), value)?;
        self.sync().await?;
        debug!("Store PUT for pair: {}", key);
        Ok(())
    }

    async fn evict(&self, pair: &CurrencyPair) -> Result<(), StoreError> {
        self.partition.remove(pair.storage_key().as_str())?;
        self.sync().await?;
        debug!("Store REMOVE for pair: {}", pair);
        Ok(())
    }
}
