//! Durable string key/value storage backing the preference store.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use crate::Config;

pub trait KeyValueStorage: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Durable once this returns `Ok`.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    /// Writes every pair or none of them.
    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()>;
}

/// All entries in one TOML table, rewritten on every write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// `storage.toml` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let path = Config::data_dir()?.join("storage.toml");
        Self::open(path)
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse storage file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(entries).context("Failed to serialize storage")?;
        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write storage file: {}", self.path.display()))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    /// The in-memory table only changes once the file has been written.
    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        for (key, value) in pairs {
            next.insert(key.to_string(), value.to_string());
        }
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Lives as long as the process; for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.lock();
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("storage.toml");

        let storage = FileStorage::open(&path).expect("open");
        assert_eq!(storage.get("temperatureUnit").expect("get"), None);
        storage.set("temperatureUnit", "fahrenheit").expect("set");
        storage.set("favoriteCities", r#"[{"id":"x"}]"#).expect("set");

        let reopened = FileStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get("temperatureUnit").expect("get").as_deref(), Some("fahrenheit"));
        assert_eq!(
            reopened.get("favoriteCities").expect("get").as_deref(),
            Some(r#"[{"id":"x"}]"#)
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.toml");
        fs::write(&path, "not = [valid").expect("write");

        let err = FileStorage::open(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse storage file"));
    }

    #[test]
    fn failed_flush_leaves_entries_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A plain file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").expect("write");
        let storage = FileStorage::open(blocker.join("storage.toml")).expect("open");

        let pairs = [("theme", "dark"), ("temperatureUnit", "fahrenheit")];
        assert!(storage.set_many(&pairs).is_err());
        assert_eq!(storage.get("theme").expect("get"), None);
        assert_eq!(storage.get("temperatureUnit").expect("get"), None);
    }

    #[test]
    fn memory_storage_overwrites() {
        let storage = MemoryStorage::new();
        storage.set("theme", "dark").expect("set");
        storage.set("theme", "light").expect("set");
        assert_eq!(storage.get("theme").expect("get").as_deref(), Some("light"));
    }
}
