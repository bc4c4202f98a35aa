//! Process-wide store handle cache.
//!
//! Opening the vault database is the one expensive, fallible setup step,
//! so it happens at most once per process. The cache holds a single slot
//! behind a mutex; the first caller opens the store while later callers
//! block on the same lock and then share the established handle
//! (single-flight acquisition). A failed open leaves the slot empty, so
//! the next caller retries instead of inheriting a poisoned handle.

use std::path::Path;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use super::sqlite::SqliteStore;
use crate::error::{Result, VaultError};

/// A lazily-filled slot holding the shared store handle.
pub struct StoreCache {
    slot: Mutex<Option<Arc<SqliteStore>>>,
}

impl StoreCache {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Get the shared store, opening it on first use.
    ///
    /// The slot lock is held across the open, so concurrent callers
    /// wait for the in-flight attempt instead of racing to open
    /// duplicate connections. Once a store is established the path
    /// argument of later calls is ignored.
    ///
    /// # Errors
    ///
    /// Propagates the open failure to every caller of the failed
    /// attempt and leaves the slot empty for retry.
    pub fn acquire(&self, path: &Path) -> Result<Arc<SqliteStore>> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| VaultError::Storage("Store cache poisoned".to_string()))?;

        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(SqliteStore::open(path)?);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Drop the cached handle. The next acquire opens fresh.
    pub fn reset(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

impl Default for StoreCache {
    fn default() -> Self {
        Self::new()
    }
}

static STORE_CACHE: Lazy<StoreCache> = Lazy::new(StoreCache::new);

/// Acquire the process-wide shared store handle.
pub fn acquire_store(path: &Path) -> Result<Arc<SqliteStore>> {
    STORE_CACHE.acquire(path)
}

/// Reset the process-wide cache. Used by tests.
pub fn reset_store_cache() {
    STORE_CACHE.reset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_returns_shared_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        let cache = StoreCache::new();
        let first = cache.acquire(&path).unwrap();
        let second = cache.acquire(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_acquire_leaves_slot_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StoreCache::new();

        // A directory path cannot be opened as a database file
        assert!(cache.acquire(dir.path()).is_err());

        // The failure must not poison the slot
        let path = dir.path().join("vault.db");
        assert!(cache.acquire(&path).is_ok());
    }

    #[test]
    fn test_reset_drops_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        let cache = StoreCache::new();
        let first = cache.acquire(&path).unwrap();
        cache.reset();
        let second = cache.acquire(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_acquire_shares_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        let cache = Arc::new(StoreCache::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let path = path.clone();
            handles.push(thread::spawn(move || cache.acquire(&path).unwrap()));
        }

        let stores: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for store in &stores[1..] {
            assert!(Arc::ptr_eq(&stores[0], store));
        }
    }
}
