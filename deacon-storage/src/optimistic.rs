//! Optimistic cache: answer from the last known value, refresh in the
//! background.
//!
//! [`OptimisticCache::cache`] hands back the persisted value for a key right
//! away and always starts a fresh fetch. When the fetch succeeds its value
//! replaces the persisted one; when it fails the persisted value is left
//! alone and the error goes to whoever awaits [`Fetched`].

use crate::persistent::PersistentCache;
use crate::stats::CacheStats;
use crate::store::KeyValueStore;
use deacon_core::{DeaconResult, RemoteError};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// Result of an optimistic read.
#[derive(Debug)]
pub struct Optimistic<T> {
    /// The last successfully fetched value, if any.
    pub optimistic: Option<T>,
    /// The in-flight refresh.
    pub fetched: Fetched<T>,
}

/// Handle to a spawned fetch.
///
/// Dropping it detaches the task; the fetch and the cache write still run to
/// completion.
#[derive(Debug)]
pub struct Fetched<T> {
    handle: JoinHandle<DeaconResult<T>>,
}

impl<T> Fetched<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Fetched<T> {
    type Output = DeaconResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(RemoteError::TaskFailed {
                reason: e.to_string(),
            }
            .into()),
        })
    }
}

/// Read-then-refresh cache over a [`PersistentCache`].
///
/// Concurrent calls for the same key each start their own fetch; whichever
/// write lands last wins.
#[derive(Debug, Clone)]
pub struct OptimisticCache {
    cache: PersistentCache,
}

impl OptimisticCache {
    pub fn new(cache: PersistentCache) -> Self {
        Self { cache }
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(PersistentCache::new(store))
    }

    /// Return the cached value for `key` and start `fetcher` on the runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn cache<T, F, Fut>(&self, key: impl Into<String>, fetcher: F) -> Optimistic<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DeaconResult<T>> + Send + 'static,
    {
        let key = key.into();
        let optimistic = self.cache.get::<T>(&key);

        let cache = self.cache.clone();
        let fetch = fetcher();
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            match &result {
                Ok(value) => {
                    if let Err(e) = cache.set(&key, value) {
                        tracing::warn!(key = %key, error = %e, "Failed to persist fetched value");
                        cache.counters().write_failure();
                    }
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Fetch failed, keeping cached value");
                    cache.counters().fetch_failure();
                }
            }
            result
        });

        Optimistic {
            optimistic,
            fetched: Fetched { handle },
        }
    }

    /// Read without refreshing.
    pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.get(key)
    }

    /// Drop every cached value in this cache's namespace.
    pub fn clear(&self) -> DeaconResult<usize> {
        self.cache.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn persistent(&self) -> &PersistentCache {
        &self.cache
    }
}
