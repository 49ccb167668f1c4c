//! Persistence backends for record collections
//!
//! A backend loads and saves a whole collection at once. The JSON file
//! backend re-reads the file on every load and rewrites it on every save;
//! nothing is cached between calls.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{Error, Result};

/// Whole-collection load/save
pub trait Persistence<T>: Send + Sync {
    /// Load every record
    fn load(&self) -> Result<Vec<T>>;

    /// Replace the persisted collection with `records`
    fn save(&self, records: &[T]) -> Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Records held in process memory, lost on restart
pub struct MemoryPersistence<T> {
    records: Mutex<Vec<T>>,
}

impl<T> MemoryPersistence<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl<T> Default for MemoryPersistence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Persistence<T> for MemoryPersistence<T> {
    fn load(&self) -> Result<Vec<T>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn save(&self, records: &[T]) -> Result<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))?;
        *stored = records.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Records stored as a pretty-printed JSON array in a single file
///
/// A missing or unparsable file loads as an empty collection (logged). The
/// next save then overwrites whatever was there.
pub struct JsonFilePersistence<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFilePersistence<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists yet
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl<T: Serialize + DeserializeOwned> Persistence<T> for JsonFilePersistence<T> {
    fn load(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Collection file not found, starting empty");
            return Ok(Vec::new());
        }

        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read collection file");
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Vec<T>>(&data) {
            Ok(records) => Ok(records),
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "Collection file is corrupt, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;

        // Write to a sibling then rename so readers never see a partial file
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, json)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            warn!(path = %self.path.display(), error = %e, "Atomic rename failed");
            let _ = std::fs::remove_file(&tmp_path);
            return Err(Error::Persistence(format!(
                "failed to write {}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
