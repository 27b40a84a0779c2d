//! Session store: bearer token and anonymous visitor id.
//!
//! # Design
//! `SessionStore` is the only place that reads or writes session state. It
//! keeps an in-memory mirror loaded from a `SessionStorage` at construction
//! and writes through to that storage on every change. If the storage fails,
//! the store logs a warning and keeps going in memory only; session
//! operations never fail.
//!
//! The token is cleared on logout and on any 401. The visitor id is created
//! on first use and is never cleared by auth events.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use uuid::Uuid;

pub const TOKEN_KEY: &str = "token";
pub const VISITOR_ID_KEY: &str = "visitorId";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session storage is not a JSON object: {0}")]
    Format(#[from] serde_json::Error),
}

/// Persistent key/value storage backing a `SessionStore`.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage that lives and dies with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Storage kept as a flat JSON object in a single file.
///
/// A missing file reads as empty. Parent directories are created on first
/// write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub visitor_id: Option<String>,
}

struct Inner {
    storage: Box<dyn SessionStorage>,
    state: RwLock<Session>,
    degraded: AtomicBool,
}

/// Shared handle to the session. Clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("SessionStore")
            .field("has_token", &state.token.is_some())
            .field("visitor_id", &state.visitor_id)
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl SessionStore {
    /// Load the session from `storage`. Unreadable storage starts an empty,
    /// in-memory-only session.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let mut degraded = false;
        let mut read = |key: &str| match storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key, "session storage unreadable, using in-memory session");
                degraded = true;
                None
            }
        };
        let state = Session {
            token: read(TOKEN_KEY),
            visitor_id: read(VISITOR_ID_KEY),
        };
        Self {
            inner: Arc::new(Inner {
                storage: Box::new(storage),
                state: RwLock::new(state),
                degraded: AtomicBool::new(degraded),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(path))
    }

    /// True once persistence has failed and the session lives in memory only.
    pub fn is_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Session {
        self.inner.state.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.read().token.clone()
    }

    pub fn has_token(&self) -> bool {
        self.inner.state.read().token.is_some()
    }

    // Token writes persist under the state lock so the storage sees them in
    // the same order as the mirror.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut state = self.inner.state.write();
        self.persist(TOKEN_KEY, Some(&token));
        state.token = Some(token);
    }

    pub fn clear_token(&self) {
        let mut state = self.inner.state.write();
        self.persist(TOKEN_KEY, None);
        state.token = None;
    }

    /// Return the stored visitor id, creating and persisting one if absent.
    pub fn get_or_create_visitor_id(&self) -> String {
        if let Some(id) = self.inner.state.read().visitor_id.clone() {
            return id;
        }
        let mut state = self.inner.state.write();
        // Another caller may have created it between the two locks.
        if let Some(id) = state.visitor_id.clone() {
            return id;
        }
        let id = generate_visitor_id();
        self.persist(VISITOR_ID_KEY, Some(&id));
        state.visitor_id = Some(id.clone());
        id
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        if self.is_degraded() {
            return;
        }
        let result = match value {
            Some(v) => self.inner.storage.set(key, v),
            None => self.inner.storage.remove(key),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, key, "session storage failed, continuing in memory only");
            self.inner.degraded.store(true, Ordering::Relaxed);
        }
    }
}

/// `v_<unix millis>_<9 random base36 chars>`. Good enough for best-effort
/// analytics deduplication, not a uniqueness guarantee.
pub fn generate_visitor_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut n = Uuid::new_v4().as_u128();
    let suffix: String = (0..9)
        .map(|_| {
            let digit = (n % 36) as u32;
            n /= 36;
            char::from_digit(digit, 36).unwrap_or('0')
        })
        .collect();
    format!("v_{millis}_{suffix}")
}
