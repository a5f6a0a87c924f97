//! Unit, theme and favorite locations, written through to storage on every
//! change.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{str::FromStr, sync::Arc};
use tracing::{debug, warn};

use crate::{
    model::{Location, Preferences, TemperatureUnit, Theme},
    storage::KeyValueStorage,
};

pub const FAVORITES_KEY: &str = "favoriteCities";
pub const UNIT_KEY: &str = "temperatureUnit";
pub const THEME_KEY: &str = "theme";

#[derive(Debug)]
pub struct PreferenceStore {
    storage: Arc<dyn KeyValueStorage>,
    current: Mutex<Preferences>,
}

impl PreferenceStore {
    /// Reads all entries from `storage`.
    ///
    /// An unreadable or unparsable entry falls back to its default with a
    /// warning; only a failing storage backend is an error.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
        let favorites = match storage.get(FAVORITES_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<Location>>(&raw).unwrap_or_else(|err| {
                warn!(key = FAVORITES_KEY, error = %err, "ignoring corrupt favorites");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let prefs = Preferences {
            unit: parse_or_default(storage.as_ref(), UNIT_KEY)?,
            theme: parse_or_default(storage.as_ref(), THEME_KEY)?,
            favorites: dedup_by_id(favorites),
        };

        debug!(
            unit = %prefs.unit,
            theme = %prefs.theme,
            favorites = prefs.favorites.len(),
            "preferences loaded"
        );
        Ok(Self { storage, current: Mutex::new(prefs) })
    }

    pub fn preferences(&self) -> Preferences {
        self.current.lock().clone()
    }

    pub fn set_unit(&self, unit: TemperatureUnit) -> Result<()> {
        self.update(|prefs| prefs.unit = unit)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.update(|prefs| prefs.theme = theme)
    }

    /// Returns `false` when a favorite with the same id already exists.
    pub fn add_favorite(&self, location: Location) -> Result<bool> {
        let mut added = false;
        self.update(|prefs| {
            if !prefs.is_favorite(&location.id) {
                prefs.favorites.push(location);
                added = true;
            }
        })?;
        Ok(added)
    }

    /// Returns `false` when no favorite had that id.
    pub fn remove_favorite(&self, id: &str) -> Result<bool> {
        let mut removed = false;
        self.update(|prefs| {
            let before = prefs.favorites.len();
            prefs.favorites.retain(|loc| loc.id != id);
            removed = prefs.favorites.len() != before;
        })?;
        Ok(removed)
    }

    /// Applies `change` to a copy, persists the copy, and only then makes it
    /// current. A storage failure leaves the in-memory state untouched.
    fn update(&self, change: impl FnOnce(&mut Preferences)) -> Result<()> {
        let mut current = self.current.lock();
        let mut next = current.clone();
        change(&mut next);
        self.persist(&next)?;
        *current = next;
        Ok(())
    }

    fn persist(&self, prefs: &Preferences) -> Result<()> {
        let favorites =
            serde_json::to_string(&prefs.favorites).context("Failed to serialize favorites")?;
        self.storage.set_many(&[
            (FAVORITES_KEY, favorites.as_str()),
            (UNIT_KEY, prefs.unit.as_str()),
            (THEME_KEY, prefs.theme.as_str()),
        ])
    }
}

fn parse_or_default<T>(storage: &dyn KeyValueStorage, key: &str) -> Result<T>
where
    T: FromStr<Err = anyhow::Error> + Default,
{
    let Some(raw) = storage.get(key)? else {
        return Ok(T::default());
    };
    Ok(raw.parse().unwrap_or_else(|err| {
        warn!(key, error = %err, "ignoring corrupt preference");
        T::default()
    }))
}

fn dedup_by_id(favorites: Vec<Location>) -> Vec<Location> {
    let mut unique: Vec<Location> = Vec::with_capacity(favorites.len());
    for loc in favorites {
        if !unique.iter().any(|u| u.id == loc.id) {
            unique.push(loc);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        storage::{FileStorage, MemoryStorage},
        testing::location,
    };
    use anyhow::bail;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory storage that rejects every write while `full` is set.
    #[derive(Debug, Default)]
    struct FullDisk {
        inner: MemoryStorage,
        full: AtomicBool,
    }

    impl KeyValueStorage for FullDisk {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
            if self.full.load(Ordering::SeqCst) {
                bail!("disk full");
            }
            self.inner.set_many(pairs)
        }
    }

    fn memory_store() -> (Arc<MemoryStorage>, PreferenceStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = PreferenceStore::load(storage.clone()).expect("load");
        (storage, store)
    }

    #[test]
    fn fresh_store_has_defaults() {
        let (_, store) = memory_store();
        assert_eq!(store.preferences(), Preferences::default());
    }

    #[test]
    fn duplicate_favorite_is_ignored() {
        let (_, store) = memory_store();

        assert!(store.add_favorite(location("mumbai", 19.07)).expect("add"));
        assert!(!store.add_favorite(location("mumbai", 19.07)).expect("add"));
        assert_eq!(store.preferences().favorites.len(), 1);
    }

    #[test]
    fn favorites_keep_insertion_order_and_remove_by_id() {
        let (_, store) = memory_store();
        for id in ["tokyo", "paris", "lima"] {
            store.add_favorite(location(id, 1.0)).expect("add");
        }

        assert!(store.remove_favorite("paris").expect("remove"));
        assert!(!store.remove_favorite("paris").expect("remove"));

        let ids: Vec<_> = store.preferences().favorites.into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["tokyo", "lima"]);
    }

    #[test]
    fn every_mutation_is_written_through() {
        let (storage, store) = memory_store();

        store.set_unit(TemperatureUnit::Fahrenheit).expect("unit");
        assert_eq!(storage.get(UNIT_KEY).expect("get").as_deref(), Some("fahrenheit"));

        store.set_theme(Theme::Dark).expect("theme");
        assert_eq!(storage.get(THEME_KEY).expect("get").as_deref(), Some("dark"));

        store.add_favorite(location("oslo", 59.9)).expect("add");
        let raw = storage.get(FAVORITES_KEY).expect("get").expect("favorites written");
        let saved: Vec<Location> = serde_json::from_str(&raw).expect("json");
        assert_eq!(saved[0].id, "oslo");
    }

    #[test]
    fn survives_restart_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.toml");

        {
            let storage = Arc::new(FileStorage::open(&path).expect("open"));
            let store = PreferenceStore::load(storage).expect("load");
            store.set_unit(TemperatureUnit::Fahrenheit).expect("unit");
            store.add_favorite(location("berlin", 52.52)).expect("add");
        }

        let storage = Arc::new(FileStorage::open(&path).expect("reopen"));
        let prefs = PreferenceStore::load(storage).expect("load").preferences();
        assert_eq!(prefs.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(prefs.favorites.len(), 1);
        assert_eq!(prefs.favorites[0].id, "berlin");
    }

    #[test]
    fn failed_write_changes_nothing_in_memory_or_storage() {
        let storage = Arc::new(FullDisk::default());
        let store = PreferenceStore::load(storage.clone()).expect("load");
        store.set_theme(Theme::Light).expect("theme");

        storage.full.store(true, Ordering::SeqCst);
        let err = store.add_favorite(location("oslo", 59.9)).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(store.set_unit(TemperatureUnit::Fahrenheit).is_err());
        assert!(store.preferences().favorites.is_empty());

        storage.full.store(false, Ordering::SeqCst);
        let reloaded = PreferenceStore::load(storage).expect("reload").preferences();
        assert!(reloaded.favorites.is_empty());
        assert_eq!(reloaded.unit, TemperatureUnit::Celsius);
        assert_eq!(reloaded.theme, Theme::Light);
    }

    #[test]
    fn duplicate_stored_favorites_collapse_on_load() {
        let storage = Arc::new(MemoryStorage::new());
        let twice = vec![location("rome", 41.9), location("rome", 41.9), location("nice", 43.7)];
        let raw = serde_json::to_string(&twice).expect("json");
        storage.set(FAVORITES_KEY, &raw).expect("set");

        let prefs = PreferenceStore::load(storage).expect("load").preferences();
        let ids: Vec<_> = prefs.favorites.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["rome", "nice"]);
    }

    #[test]
    fn corrupt_entries_fall_back_to_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(FAVORITES_KEY, "{not json").expect("set");
        storage.set(UNIT_KEY, "kelvin").expect("set");
        storage.set(THEME_KEY, "dark").expect("set");

        let prefs = PreferenceStore::load(storage).expect("load").preferences();
        assert!(prefs.favorites.is_empty());
        assert_eq!(prefs.unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.theme, Theme::Dark);
    }
}
