//! In-memory key/value storage.
//!
//! Stands in for browser local/session storage. An optional byte quota
//! (keys plus values) reproduces the quota-exceeded failure mode.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use super::{KeyValueStorage, Result, StorageError};

/// In-memory storage with an optional quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<FxHashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Create unbounded storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage that rejects writes once keys plus values would exceed
    /// `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    /// Check if a key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("a").unwrap(), None);
        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap(), Some("1".to_string()));

        storage.remove("a").unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        // Removing twice is fine
        storage.remove("a").unwrap();
    }

    #[test]
    fn test_quota_exceeded() {
        let storage = MemoryStorage::with_quota(10);

        storage.set("k", "12345").unwrap();
        let err = storage.set("other", "123456").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(!storage.contains("other"));
    }

    #[test]
    fn test_overwrite_does_not_double_count() {
        let storage = MemoryStorage::with_quota(10);

        storage.set("k", "123456789").unwrap();
        storage.set("k", "987654321").unwrap();
        assert_eq!(storage.used_bytes(), 10);
    }
}
