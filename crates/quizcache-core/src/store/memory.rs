use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{KeyValueStore, StoreError};

/// In-memory store, optionally capped at a byte quota.
///
/// Sizes are counted as two bytes per character, the same accounting the
/// cache statistics use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn stored_size(key: &str, value: &str) -> usize {
        (key.chars().count() + value.chars().count()) * 2
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| Self::stored_size(k, v))
                .sum();
            let needed = Self::stored_size(key, value);
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StoreError::QuotaExceeded { needed, available });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.put("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        // Deleting again is fine
        store.delete("a").unwrap();
    }

    #[test]
    fn test_scan_prefix() {
        let store = MemoryStore::new();
        store.put("quiz_cache_nine_bangla", "{}").unwrap();
        store.put("quiz_cache_nine_math", "{}").unwrap();
        store.put("theme", "dark").unwrap();
        let keys = store.scan("quiz_cache_").unwrap();
        assert_eq!(keys, vec!["quiz_cache_nine_bangla", "quiz_cache_nine_math"]);
    }

    #[test]
    fn test_quota_exceeded() {
        let store = MemoryStore::with_quota(20);
        store.put("k", "abc").unwrap(); // 8 bytes
        let err = store.put("j", "0123456789").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        // Overwriting the same key only counts the new value
        store.put("k", "abcdefgh").unwrap();
        assert_eq!(store.len(), 1);
    }
}
