//! # Local key-value storage
//!
//! Everything the app remembers lives behind [`KeyValueStore`]: string keys
//! mapping to whole JSON documents. Collections are read in full, changed in
//! memory and written back in full; the last write wins.
//!
//! ## Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `todoAppUsers` | array of every registered user |
//! | `todoAppTasks_<username>` | array of that user's tasks |
//! | `todoAppCurrentUser` | the logged-in user, absent when logged out |

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub const USERS_KEY: &str = "todoAppUsers";
pub const CURRENT_USER_KEY: &str = "todoAppCurrentUser";
pub const TASKS_KEY_PREFIX: &str = "todoAppTasks_";

/// Key holding the task collection owned by `username`.
pub fn tasks_key(username: &str) -> String {
    format!("{TASKS_KEY_PREFIX}{username}")
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads `key` as JSON. A missing or unparseable value reads as `T::default()`.
pub fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, %err, "ignoring malformed stored value");
            T::default()
        }
    }
}

/// Serializes `value` and writes it under `key`, replacing what was there.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

// Everything except ASCII alphanumerics, '_' and '-' is escaped, so '.' and
// '/' in a username can never leave the data directory.
const KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Filesystem store: one `<escaped key>.json` file per key under `base`.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = utf8_percent_encode(key, KEY_ESCAPE).to_string();
        self.base.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").as_deref(), Some("v"));

        other.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_load_json_missing_or_malformed_is_default() {
        let store = MemoryStore::new();
        let empty: Vec<String> = load_json(&store, "absent");
        assert!(empty.is_empty());

        store.set("broken", "{not json").unwrap();
        let broken: Vec<String> = load_json(&store, "broken");
        assert!(broken.is_empty());

        let missing_user: Option<String> = load_json(&store, "absent");
        assert!(missing_user.is_none());
    }

    #[test]
    fn test_save_then_load_json() {
        let store = MemoryStore::new();
        save_json(&store, "list", &vec!["a", "b"]).unwrap();
        let loaded: Vec<String> = load_json(&store, "list");
        assert_eq!(loaded, vec!["a", "b"]);
    }

    #[test]
    fn test_file_store_escapes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");
        let store = FileStore::new(&base);

        let key = tasks_key("../evil/name");
        store.set(&key, "[]").unwrap();
        assert_eq!(store.get(&key).as_deref(), Some("[]"));

        // the escaped file sits directly in the base directory
        let files: Vec<String> = fs::read_dir(&base)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files, vec!["todoAppTasks_%2E%2E%2Fevil%2Fname.json"]);
        assert!(!dir.path().join("evil").exists());

        store.remove(&key).unwrap();
        assert!(store.get(&key).is_none());
        // removing twice is fine
        store.remove(&key).unwrap();
    }

    #[test]
    fn test_file_store_get_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));
        assert!(store.get(USERS_KEY).is_none());
    }
}
