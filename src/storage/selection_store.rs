//! Durable Selection Storage
//!
//! Client-side key/value persistence for the last active site. The durable
//! backend may be unavailable (read-only home, sandboxed environment); the
//! [`SelectionStore`] then keeps working from memory for the rest of the session.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use atlasfield_core::SiteId;
use tracing::{debug, warn};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_dir;

/// Storage key holding the last active site id
pub const ACTIVE_SITE_KEY: &str = "atlasfield.activeSiteId";

/// String key/value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

// ============================================================================
// Backends
// ============================================================================

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Flat JSON object on disk (~/.atlasfield/state.json)
///
/// Every write rewrites the whole file; the state is a handful of keys.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store, reading existing entries if the file exists
    pub fn open(path: PathBuf) -> AppResult<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

// ============================================================================
// Selection Store
// ============================================================================

/// Persists the active site id, degrading to memory when the backend fails
pub struct SelectionStore {
    durable: Arc<dyn KeyValueStore>,
    fallback: MemoryKeyValueStore,
    degraded: AtomicBool,
}

impl SelectionStore {
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable,
            fallback: MemoryKeyValueStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// A store with no durable backend at all
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Whether persistence has fallen back to session-only
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn degrade(&self, err: &AppError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(error = %err, "Durable selection storage unavailable, keeping selection in memory");
        }
    }

    /// Last saved site id; unparsable values read as absent
    pub fn load(&self) -> Option<SiteId> {
        let raw = if self.is_degraded() {
            self.fallback.get(ACTIVE_SITE_KEY).ok().flatten()
        } else {
            match self.durable.get(ACTIVE_SITE_KEY) {
                Ok(value) => value,
                Err(err) => {
                    self.degrade(&err);
                    None
                }
            }
        };
        let raw = raw?;

        match raw.trim().parse::<SiteId>() {
            Ok(id) => Some(id),
            Err(_) => {
                debug!(value = %raw, "Ignoring unparsable stored site id");
                None
            }
        }
    }

    /// Save (or clear, for `None`) the active site id
    pub fn save(&self, site_id: Option<SiteId>) {
        // The session copy is always current so a later degradation loses nothing
        let session = match site_id {
            Some(id) => self.fallback.set(ACTIVE_SITE_KEY, &id.to_string()),
            None => self.fallback.remove(ACTIVE_SITE_KEY),
        };
        if let Err(err) = session {
            debug!(error = %err, "Session copy of the active site not updated");
        }

        if self.is_degraded() {
            return;
        }

        let result = match site_id {
            Some(id) => self.durable.set(ACTIVE_SITE_KEY, &id.to_string()),
            None => self.durable.remove(ACTIVE_SITE_KEY),
        };
        if let Err(err) = result {
            self.degrade(&err);
        }
    }
}
