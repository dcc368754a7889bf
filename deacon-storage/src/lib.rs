//! Deacon Storage - Persistent and Optimistic Caching
//!
//! A [`KeyValueStore`] holds raw strings. [`PersistentCache`] layers typed
//! JSON values and a key namespace on top, and [`OptimisticCache`] turns that
//! into "last known value now, fresh value later".

pub mod optimistic;
pub mod persistent;
pub mod stats;
pub mod store;

pub use optimistic::{Fetched, Optimistic, OptimisticCache};
pub use persistent::PersistentCache;
pub use stats::CacheStats;
pub use store::{InMemoryStore, JsonFileStore, KeyValueStore};

use deacon_core::{CacheConfig, DeaconResult};
use std::sync::Arc;

/// Build the store described by `config`: a JSON file when a path is set,
/// otherwise process memory.
pub fn store_from_config(config: &CacheConfig) -> DeaconResult<Arc<dyn KeyValueStore>> {
    match &config.store_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Opening file-backed cache store");
            Ok(Arc::new(JsonFileStore::open(path.clone())?))
        }
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}
