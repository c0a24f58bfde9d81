//! Session-lifetime key/value storage backends
//!
//! Mirrors the browser's `sessionStorage`: string values under string keys that
//! live for one session. [`MemorySessionStorage`] lasts as long as the process;
//! [`FileSessionStorage`] keeps one JSON map per session file so the session
//! survives a reload of the client, and is discarded with
//! [`FileSessionStorage::destroy`] when the session ends.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use log::warn;

/// Session storage failures
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("session storage lock poisoned")]
    Poisoned,
}

/// Key/value storage scoped to one session
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written
    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError>;
}

/// In-process session storage
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let items = self.items.read().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut items = self.items.write().map_err(|_| SessionStoreError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut items = self.items.write().map_err(|_| SessionStoreError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// Session storage persisted to a JSON file
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Storage backed by the file at `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage for session `session_id` inside `dir`
    ///
    /// Characters other than ASCII alphanumerics, `-` and `_` are replaced with
    /// `_`, so the file always lands directly inside `dir`.
    #[must_use]
    pub fn for_session(dir: &Path, session_id: &str) -> Self {
        let file_stem: String = session_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self::new(dir.join(format!("{file_stem}.session.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// End the session, discarding everything stored in it
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed
    pub fn destroy(&self) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().map_err(|_| SessionStoreError::Poisoned)?;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn read_items(&self) -> Result<HashMap<String, String>, SessionStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current items for a read-modify-write
    ///
    /// A corrupt file is replaced rather than blocking every later write.
    fn read_items_for_write(&self) -> Result<HashMap<String, String>, SessionStoreError> {
        match self.read_items() {
            Err(SessionStoreError::Corrupt(e)) => {
                warn!(
                    "Discarding corrupt session file {}: {e}",
                    self.path.display()
                );
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    fn write_items(&self, items: &HashMap<String, String>) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(items)?)?;
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let _guard = self.lock.lock().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().map_err(|_| SessionStoreError::Poisoned)?;
        let mut items = self.read_items_for_write()?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().map_err(|_| SessionStoreError::Poisoned)?;
        match self.read_items() {
            Ok(mut items) => {
                if items.remove(key).is_some() {
                    self.write_items(&items)?;
                }
                Ok(())
            }
            Err(SessionStoreError::Corrupt(e)) => {
                warn!(
                    "Discarding corrupt session file {}: {e}",
                    self.path.display()
                );
                self.write_items(&HashMap::new())
            }
            Err(e) => Err(e),
        }
    }
}
