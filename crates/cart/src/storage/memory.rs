//! In-process key-value store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{KeyValueStore, StorageError, validate_key};

/// Shared in-memory slots.
///
/// Clones share the same map, which makes two `CartStore`s opened on clones
/// behave like two tabs of one origin: each sees whatever was flushed last.
/// An optional quota caps the total size of all stored values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose values may total at most `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            inner: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Total size in bytes of all stored values.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.inner
            .read()
            .map(|slots| slots.values().map(String::len).sum())
            .unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let slots = self
            .inner
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut slots = self
            .inner
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;

        if let Some(quota) = self.quota {
            let others: usize = slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.inner
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_slots() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("cart", "[]").unwrap();
        assert_eq!(b.get("cart").unwrap().as_deref(), Some("[]"));
        b.remove("cart").unwrap();
        assert_eq!(a.get("cart").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_other_slots() {
        let store = MemoryStore::with_quota(10);
        store.set("token", "abcdef").unwrap();
        let err = store.set("cart", "12345").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 11,
                quota: 10
            }
        ));
        // Overwriting a slot only counts its new size.
        store.set("token", "abcdefghij").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_failed_set_keeps_previous_value() {
        let store = MemoryStore::with_quota(4);
        store.set("cart", "[]").unwrap();
        assert!(store.set("cart", "[1,2,3]").is_err());
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));
    }
}
