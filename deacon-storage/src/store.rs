//! Key-value store backends.
//!
//! The cache only needs `get`, `set` and prefix removal over string keys and
//! string values. Implementations provide their own interior synchronization.

use deacon_core::{DeaconResult, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Persistent string key-value store.
///
/// Calls are synchronous so a cached value can be handed back without
/// suspending. Concurrent writers to the same key resolve last-writer-wins.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> DeaconResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> DeaconResult<()>;

    /// Remove every entry whose key starts with `prefix`, returning how many
    /// were removed. Other keys are left alone.
    fn remove_prefix(&self, prefix: &str) -> DeaconResult<usize>;

    /// Remove every entry.
    fn clear(&self) -> DeaconResult<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Process-local store, used in tests and when no store path is configured.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> DeaconResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> DeaconResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> DeaconResult<usize> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }

    fn clear(&self) -> DeaconResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.clear();
        Ok(())
    }
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// Store persisted as a single JSON object on disk.
///
/// The whole file is read once on [`JsonFileStore::open`] and rewritten on
/// every mutation while the write lock is held, so the file always matches
/// the in-memory view.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> DeaconResult<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_failed = |reason: String| StoreError::WriteFailed {
            key: key.to_string(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }
        let contents =
            serde_json::to_string_pretty(entries).map_err(|e| write_failed(e.to_string()))?;
        write_atomic(&self.path, contents.as_bytes()).map_err(|e| write_failed(e.to_string()))
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}

/// Write `data` to a sibling temp file, then rename it over `path`.
///
/// The rename stays on one filesystem, so readers see either the old file or
/// the new one, never a partial write.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write as _;

    let tmp_path = temp_path_for(path);
    let mut file = std::fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_data()?;
    drop(file);
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        e
    })
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let read_failed = |reason: String| StoreError::ReadFailed {
        key: path.display().to_string(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| read_failed(e.to_string()))?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents).map_err(|e| read_failed(e.to_string()))
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> DeaconResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> DeaconResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.persist(key, &entries) {
            // Keep memory and disk in step when the write did not land.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> DeaconResult<usize> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let kept: BTreeMap<String, String> = entries
            .iter()
            .filter(|(key, _)| !key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let removed = entries.len() - kept.len();
        if removed == 0 {
            return Ok(0);
        }
        self.persist(prefix, &kept).map_err(|e| StoreError::ClearFailed {
            reason: e.to_string(),
        })?;
        *entries = kept;
        Ok(removed)
    }

    fn clear(&self) -> DeaconResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let empty = BTreeMap::new();
        self.persist("*", &empty).map_err(|e| StoreError::ClearFailed {
            reason: e.to_string(),
        })?;
        *entries = empty;
        Ok(())
    }
}
