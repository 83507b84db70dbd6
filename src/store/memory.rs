use crate::core::cache::RateStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Process-local stand-in for the persisted tier, used to observe what the
/// converter writes through.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        value
    }

    async fn put(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().await;
        debug!("Store PUT for key: {}", key);
        entries.insert(key.to_string(), value.to_string());
    }

    async fn remove_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        debug!("Store REMOVE {} keys with prefix: {}", removed, prefix);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_put() {
        let store = MemoryStore::new();

        assert!(store.get("key1").await.is_none());
        store.put("key1", "123").await;
        assert_eq!(store.get("key1").await.as_deref(), Some("123"));

        store.put("key1", "456").await;
        assert_eq!(store.get("key1").await.as_deref(), Some("456"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_remove_prefix() {
        let store = MemoryStore::new();
        store.put("exchange_rate_A_B_latest", "1").await;
        store.put("exchange_rate_A_C_latest", "2").await;
        store.put("other", "3").await;

        assert_eq!(store.remove_prefix("exchange_rate_").await, 2);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("other").await.as_deref(), Some("3"));
    }
}
