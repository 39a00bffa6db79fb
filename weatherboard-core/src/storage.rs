//! Durable storage for the saved city list.
//!
//! The store is a tiny key-value surface. Callers go through [`load_cities`]
//! and [`save_cities`], which never fail: a broken store behaves like an empty
//! one, and a failed write only costs persistence, never the live session.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{error::StorageError, model::City};

/// Key under which the city list is stored.
pub const CITIES_KEY: &str = "cities";

pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read the saved cities. `None` means "nothing usable": never written,
/// unreadable, or not a city list.
pub fn load_cities(store: &dyn KeyValueStore) -> Option<Vec<City>> {
    let raw = match store.get(CITIES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(error = %err, "Failed to load saved cities");
            return None;
        }
    };

    match serde_json::from_str::<Vec<City>>(&raw) {
        Ok(cities) => {
            debug!(count = cities.len(), "Loaded saved cities");
            Some(cities)
        }
        Err(source) => {
            let err = StorageError::Decode { key: CITIES_KEY.to_string(), source };
            warn!(error = %err, "Ignoring saved cities");
            None
        }
    }
}

/// Persist the city list, logging and swallowing any failure.
pub fn save_cities(store: &dyn KeyValueStore, cities: &[City]) {
    let encoded = match serde_json::to_string(cities) {
        Ok(encoded) => encoded,
        Err(source) => {
            let err = StorageError::Encode { key: CITIES_KEY.to_string(), source };
            warn!(error = %err, "Failed to save cities");
            return;
        }
    };

    if let Err(err) = store.set(CITIES_KEY, &encoded) {
        warn!(error = %err, "Failed to save cities");
    } else {
        debug!(count = cities.len(), "Saved cities");
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { key: key.to_string(), source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_err = |source: io::Error| StorageError::Write { key: key.to_string(), source };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write then rename so a crash never leaves a half-written list.
        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &target).map_err(write_err)?;
        Ok(())
    }
}

/// In-memory store. Counts writes so callers can observe persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cities(cities: &[City]) -> Self {
        let store = Self::default();
        save_cities(&store, cities);
        store.reset_writes();
        store
    }

    pub fn with_raw(key: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.values.insert(key.to_string(), value.to_string());
        }
        store
    }

    pub fn writes(&self) -> usize {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }

    pub fn reset_writes(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.writes = 0;
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().ok().and_then(|inner| inner.values.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Ok(mut inner) = self.inner.lock() {
            inner.values.insert(key.to_string(), value.to_string());
            inner.writes += 1;
        }
        Ok(())
    }
}
