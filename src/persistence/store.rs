//! Durable string key-value stores

use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Persistent string → string map surviving process restarts
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&mut self, key: &str, value: String);

    /// Commit pending writes to the backing medium
    fn flush(&mut self) -> Result<()>;
}

/// In-memory store, used when nothing needs to outlive the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Store backed by a JSON object file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read durable state from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse durable state in {}", path.display()))?
        } else {
            debug!("No durable state at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Open the store, falling back to an empty one if the file is unusable.
    ///
    /// The next flush overwrites the unusable file.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!("Ignoring durable state: {:#}", e);
                Self {
                    path,
                    entries: BTreeMap::new(),
                }
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let serialized = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write durable state to {}", self.path.display()))?;

        info!("Durable state written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_put() {
        let mut store = MemoryStore::with_entries([("a", "1")]);
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.put("a", "2".to_string());
        assert_eq!(store.get("a").as_deref(), Some("2"));
        assert_eq!(store.get("b"), None);
        assert!(store.flush().is_ok());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("workout_type"), None);
        store.put("workout_type", "squats".to_string());
        store.flush().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("workout_type").as_deref(), Some("squats"));
    }

    #[test]
    fn unflushed_writes_are_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = FileStore::open(&path).unwrap();
        store.put("workout_type", "squats".to_string());
        drop(store);

        assert_eq!(FileStore::open(&path).unwrap().get("workout_type"), None);
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        assert!(FileStore::open(&path).is_err());
        let store = FileStore::open_or_empty(&path);
        assert_eq!(store.get("workout_type"), None);
    }
}
