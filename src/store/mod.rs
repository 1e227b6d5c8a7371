pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::store::RateStore;
use anyhow::{Context, Result};
use disk::DiskRateStore;
use memory::MemoryRateStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the rate store selected by the configuration. Persistent stores live
/// under `<data_path>/cache`.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn RateStore>> {
    if !config.store.persist {
        debug!("Using in-memory rate store");
        return Ok(Arc::new(MemoryRateStore::new()));
    }

    let cache_dir = config.default_data_path()?.join("cache");
    let store = DiskRateStore::open(&cache_dir)
        .with_context(|| format!("Failed to open rate store at {}", cache_dir.display()))?;
    Ok(Arc::new(store))
}
