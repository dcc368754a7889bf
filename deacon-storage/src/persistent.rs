//! Typed, namespaced view over a [`KeyValueStore`].

use crate::stats::{CacheCounters, CacheStats};
use crate::store::KeyValueStore;
use deacon_core::{CacheConfig, DeaconResult, StoreError, CACHE_PREFIX};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// JSON-serializing cache over a shared store.
///
/// Every key is prefixed with the namespace so cache entries stay apart from
/// other state kept in the same store. Cloning is cheap and clones share the
/// store and the counters.
#[derive(Clone)]
pub struct PersistentCache {
    store: Arc<dyn KeyValueStore>,
    namespace: Arc<str>,
    counters: Arc<CacheCounters>,
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache")
            .field("namespace", &self.namespace)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

impl PersistentCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_namespace(store, CACHE_PREFIX)
    }

    pub fn with_namespace(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: Arc::from(namespace.into()),
            counters: Arc::new(CacheCounters::default()),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self::with_namespace(store, config.namespace.clone())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The key actually used in the underlying store.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Never fails: a missing entry, an unreadable store or a value that no
    /// longer deserializes into `T` are all reported as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = self.storage_key(key);
        let raw = match self.store.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %storage_key, "Cache miss");
                self.counters.miss();
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Cache read failed, treating as miss");
                self.counters.miss();
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.counters.hit();
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Corrupt cache entry, treating as miss");
                self.counters.corrupt();
                None
            }
        }
    }

    /// Serialize `value` and store it under `key`, overwriting.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> DeaconResult<()> {
        let storage_key = self.storage_key(key);
        let raw = serde_json::to_string(value).map_err(|e| StoreError::SerializationFailed {
            key: storage_key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&storage_key, raw)?;
        self.counters.write();
        tracing::debug!(key = %storage_key, "Cache entry written");
        Ok(())
    }

    /// Remove every entry in this cache's namespace, returning how many were
    /// removed. Keys outside the namespace are untouched.
    pub fn clear(&self) -> DeaconResult<usize> {
        let removed = self.store.remove_prefix(&self.namespace)?;
        tracing::debug!(namespace = %self.namespace, removed, "Cache cleared");
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> &CacheCounters {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::collections::BTreeMap;

    fn cache_with_store() -> (PersistentCache, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (PersistentCache::new(store.clone()), store)
    }

    #[test]
    fn test_keys_are_namespaced() {
        let (cache, store) = cache_with_store();
        cache.set("contacts-list-1", &vec![1, 2, 3]).unwrap();

        assert!(store.get("contacts-list-1").unwrap().is_none());
        assert_eq!(
            store.get("cache:contacts-list-1").unwrap().as_deref(),
            Some("[1,2,3]")
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let (cache, _) = cache_with_store();
        assert_eq!(cache.get::<Vec<u32>>("never-written"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (cache, store) = cache_with_store();
        store.set("cache:k", "{not json".to_string()).unwrap();
        assert_eq!(cache.get::<Vec<u32>>("k"), None);

        // Valid JSON of the wrong shape is just as unusable.
        store.set("cache:k", "\"text\"".to_string()).unwrap();
        assert_eq!(cache.get::<Vec<u32>>("k"), None);

        let stats = cache.stats();
        assert_eq!(stats.corrupt_entries, 2);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_custom_namespace() {
        let store = Arc::new(InMemoryStore::new());
        let cache = PersistentCache::with_namespace(store.clone(), "deacon:");
        cache.set("k", &true).unwrap();
        assert!(store.get("deacon:k").unwrap().is_some());
        assert_eq!(cache.get::<bool>("k"), Some(true));
    }

    #[test]
    fn test_clear_only_removes_namespaced_entries() {
        let (cache, store) = cache_with_store();
        store.set("auth_token", "secret".to_string()).unwrap();
        cache.set("contacts-list-1", &vec![1]).unwrap();
        cache.set("notes:parent1", &vec![2]).unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.get::<Vec<u32>>("contacts-list-1"), None);
        assert_eq!(store.get("auth_token").unwrap().as_deref(), Some("secret"));
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Whatever was written is what comes back.
            #[test]
            fn prop_written_value_reads_back(
                key in "[a-z0-9:-]{1,20}",
                value in prop::collection::btree_map(".*", prop::option::of(".*"), 0..8),
            ) {
                let (cache, _) = cache_with_store();
                cache.set(&key, &value).unwrap();
                let back: Option<BTreeMap<String, Option<String>>> = cache.get(&key);
                prop_assert_eq!(back, Some(value));
            }
        }
    }
}
