//! Store backed by a single JSON object file

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::StorageError;

type Entries = BTreeMap<String, String>;

/// Every operation reads the whole file and rewrites it through a temporary
/// sibling, so a crash mid-write leaves the previous contents intact. A file
/// that no longer parses fails reads but is overwritten by the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Entries::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Entries),
    {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StorageError::Serialization(e)) => {
                warn!(
                    "Replacing unreadable store {}: {}",
                    self.path.display(),
                    e
                );
                Entries::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir()
            .join(format!("momentum-funnel-{}-{}-{}", name, std::process::id(), nanos))
            .join("store.json")
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = FileStore::new(scratch_path("missing"));
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn values_survive_a_new_handle() {
        let path = scratch_path("reopen");
        FileStore::new(&path).set("@momentum/timer_start", "1000").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("@momentum/timer_start").unwrap().as_deref(),
            Some("1000")
        );
        reopened.remove_many(&["@momentum/timer_start"]).unwrap();
        assert_eq!(reopened.get("@momentum/timer_start").unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("x"), Err(StorageError::Serialization(_))));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn write_replaces_a_corrupt_file() {
        let path = scratch_path("repair");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        store.set("@momentum/timer_start", "1").unwrap();
        assert_eq!(store.get("@momentum/timer_start").unwrap().as_deref(), Some("1"));

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: Entries = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 1);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn clearing_a_corrupt_file_leaves_a_valid_empty_store() {
        let path = scratch_path("clear");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        store.remove_many(&["@momentum/timer_start"]).unwrap();
        assert_eq!(store.get("@momentum/timer_start").unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
