//! Process-wide project-path registry with TTL eviction.
//!
//! Build requests reference projects by generated id rather than by raw
//! path. Entries expire after a TTL so the table cannot grow without bound,
//! and the registry has an explicit lifecycle: [`init`] before use,
//! [`teardown`] to drop every entry.

use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::domain::errors::AdsyncError;

static REGISTRY: Lazy<RwLock<Option<PathRegistry>>> = Lazy::new(|| RwLock::new(None));

/// Keyed path store; entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct PathRegistry {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    stored_at: Instant,
}

impl PathRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Store a path and return its generated id.
    pub fn store(&self, path: impl Into<PathBuf>) -> String {
        self.evict_expired();
        let id = Uuid::new_v4().to_string();
        self.entries.insert(
            id.clone(),
            Entry {
                path: path.into(),
                stored_at: Instant::now(),
            },
        );
        id
    }

    /// Look up a previously stored path. Expired entries are removed and
    /// reported as missing.
    pub fn lookup(&self, id: &str) -> Result<PathBuf, AdsyncError> {
        if let Some(entry) = self.entries.get(id) {
            if entry.stored_at.elapsed() <= self.ttl {
                return Ok(entry.path.clone());
            }
        }
        self.entries.remove(id);
        Err(AdsyncError::NotFound(format!("project id {id}")))
    }

    pub fn remove(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Drop every entry past its TTL.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Initialize the process-wide registry. Re-initialization replaces the
/// previous registry and drops its entries.
pub fn init(ttl: Duration) {
    let mut guard = REGISTRY.write().expect("registry lock poisoned");
    *guard = Some(PathRegistry::new(ttl));
}

/// Drop the registry and everything it holds.
pub fn teardown() {
    let mut guard = REGISTRY.write().expect("registry lock poisoned");
    *guard = None;
}

/// Store a path in the process-wide registry.
pub fn store(path: impl Into<PathBuf>) -> Result<String, AdsyncError> {
    let guard = REGISTRY.read().expect("registry lock poisoned");
    let registry = guard
        .as_ref()
        .ok_or_else(|| AdsyncError::Validation("project registry not initialized".into()))?;
    Ok(registry.store(path))
}

/// Look up a path in the process-wide registry.
pub fn lookup(id: &str) -> Result<PathBuf, AdsyncError> {
    let guard = REGISTRY.read().expect("registry lock poisoned");
    let registry = guard
        .as_ref()
        .ok_or_else(|| AdsyncError::Validation("project registry not initialized".into()))?;
    registry.lookup(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_looks_up_within_ttl() {
        let registry = PathRegistry::new(Duration::from_secs(60));
        let id = registry.store("/projects/demo");
        assert_eq!(registry.lookup(&id).unwrap(), PathBuf::from("/projects/demo"));
    }

    #[test]
    fn expired_entries_are_missing_and_evicted() {
        let registry = PathRegistry::new(Duration::ZERO);
        let id = registry.store("/projects/demo");
        std::thread::sleep(Duration::from_millis(2));
        let err = registry.lookup(&id).unwrap_err();
        assert!(matches!(err, AdsyncError::NotFound(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn store_evicts_expired_entries_as_it_goes() {
        let registry = PathRegistry::new(Duration::ZERO);
        registry.store("/projects/a");
        std::thread::sleep(Duration::from_millis(2));
        registry.store("/projects/b");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = PathRegistry::new(Duration::from_secs(60));
        assert!(matches!(
            registry.lookup("missing"),
            Err(AdsyncError::NotFound(_))
        ));
    }

    #[test]
    fn process_wide_registry_has_an_explicit_lifecycle() {
        teardown();
        assert!(matches!(
            store("/projects/demo"),
            Err(AdsyncError::Validation(_))
        ));

        init(Duration::from_secs(60));
        let id = store("/projects/demo").unwrap();
        assert_eq!(lookup(&id).unwrap(), PathBuf::from("/projects/demo"));

        teardown();
        assert!(matches!(lookup(&id), Err(AdsyncError::Validation(_))));
    }

    #[test]
    fn ids_are_unique_per_store() {
        let registry = PathRegistry::new(Duration::from_secs(60));
        let first = registry.store("/projects/demo");
        let second = registry.store("/projects/demo");
        assert_ne!(first, second);
    }
}
