//! Session token storage.
//!
//! # Design
//! `SessionStore` is a single slot holding the current token. The in-memory
//! slot is authoritative; every change is written through to a
//! `TokenStorage` so a restarted client picks the token back up without
//! signing in again. A storage failure is logged and otherwise ignored: the
//! session keeps working for the life of the process.
//!
//! Nothing here runs a timer. A token is dropped only by an explicit logout
//! or when the server answers 401 (see `ApiClient::send`).

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

use crate::config::ClientConfig;

/// Durable key/value storage for the session token.
pub trait TokenStorage: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl TokenStorage for MemoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl TokenStorage for FileStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// The single authentication slot. A held token is the only signal of being
/// signed in.
pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
    key: String,
    token: RwLock<Option<String>>,
}

impl SessionStore {
    /// Open the store, restoring any token previously written under `key`.
    pub fn new(storage: impl TokenStorage + 'static, key: &str) -> Self {
        let token = match storage.load(key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored session token");
                None
            }
        };
        if token.is_some() {
            tracing::debug!("restored session token from storage");
        }
        Self {
            storage: Box::new(storage),
            key: key.to_string(),
            token: RwLock::new(token),
        }
    }

    /// Open the store under the configured token key.
    pub fn open(storage: impl TokenStorage + 'static, config: &ClientConfig) -> Self {
        Self::new(storage, &config.token_key)
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default(), crate::config::DEFAULT_TOKEN_KEY)
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the held token.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(e) = self.storage.store(&self.key, &token) {
            tracing::warn!(error = %e, "failed to persist session token");
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the held token. Returns `false` when there was nothing to clear.
    pub fn clear(&self) -> bool {
        let previous = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_none() {
            return false;
        }
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(error = %e, "failed to remove persisted session token");
        }
        true
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.key)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
