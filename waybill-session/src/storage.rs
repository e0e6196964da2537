//! Session storage backends
//!
//! Storage can be cleared from outside the process at any time, so a missing
//! entry is always a normal `Ok(None)` and never an error.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, trace};
use waybill_core::{storage_error, SessionStorage, WaybillResult};

/// In-process storage, used by tests and short-lived tools
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> WaybillResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| storage_error!("memory storage lock poisoned", "memory_storage"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> WaybillResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| storage_error!("memory storage lock poisoned", "memory_storage"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> WaybillResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| storage_error!("memory storage lock poisoned", "memory_storage"))?;
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary sibling first and are then renamed over the
/// target, so a reader sees either the old record or the new one.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> WaybillResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(storage_error!(
                format!("invalid storage key: {:?}", key),
                "file_storage"
            ));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> WaybillResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => {
                trace!(path = %path.display(), "Read session file");
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error!(
                format!("failed to read {}", path.display()),
                "file_storage",
                e
            )),
        }
    }

    fn write(&self, key: &str, value: &str) -> WaybillResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            storage_error!(
                format!("failed to create {}", self.dir.display()),
                "file_storage",
                e
            )
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| {
            storage_error!(format!("failed to write {}", tmp.display()), "file_storage", e)
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            storage_error!(
                format!("failed to replace {}", path.display()),
                "file_storage",
                e
            )
        })?;

        debug!(path = %path.display(), "Session file written");
        Ok(())
    }

    fn remove(&self, key: &str) -> WaybillResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error!(
                format!("failed to remove {}", path.display()),
                "file_storage",
                e
            )),
        }
    }
}
