use anyhow::{Context, Result};
use directories::BaseDirs;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable string key-value storage, the shape the session store persists
/// through. Implementations must make `set`/`remove` visible to a later
/// process reading the same backing location.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed store: one JSON object per file, rewritten on every change.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let entries = read_entries(&path);
        Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// The per-user default location, `<config_dir>/mentora/storage.json`.
    pub fn user_default() -> Self {
        let base = BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("mentora"))
            .unwrap_or_else(|| PathBuf::from(".mentora"));
        Self::open(base.join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    match serde_json::from_str(&contents) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "discarding malformed storage file");
            BTreeMap::new()
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}

/// Volatile store for tests and smoke runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("storage.json");

        let store = FileStore::open(&path);
        store.set("token", "tok123").expect("set");
        store.set("user", "{\"id\":1}").expect("set");
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("token").as_deref(), Some("tok123"));
        assert_eq!(reopened.get("user").as_deref(), Some("{\"id\":1}"));
    }

    #[test]
    fn file_store_remove_persists() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("storage.json");

        let store = FileStore::open(&path);
        store.set("token", "tok123").expect("set");
        store.remove("token").expect("remove");

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("token"), None);
    }

    #[test]
    fn malformed_storage_file_degrades_to_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("storage.json");
        fs::write(&path, b"not json at all").expect("write");

        let store = FileStore::open(&path);
        assert_eq!(store.get("token"), None);
    }
}
