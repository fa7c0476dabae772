//! In-process store backend.
//!
//! Process-lifetime map with lazy expiry, for local runs without a
//! configured cache service.

use crate::{KvBackend, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if Instant::now() > at)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|e| e.is_expired()) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> Result<()> {
        let expires_at = ttl_seconds.map(|s| Instant::now() + Duration::from_secs(s));
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let backend = MemoryBackend::new();
        backend.set_raw("a:1", "\"v\"".into(), None).await.unwrap();
        assert_eq!(backend.get_raw("a:1").await.unwrap().as_deref(), Some("\"v\""));
        assert_eq!(backend.get_raw("a:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_read() {
        let backend = MemoryBackend::new();
        backend.set_raw("k", "1".into(), Some(0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(backend.get_raw("k").await.unwrap(), None);
        assert!(backend.keys("k").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_filters_by_prefix() {
        let backend = MemoryBackend::new();
        backend.set_raw("issues:overview:30d", "1".into(), None).await.unwrap();
        backend.set_raw("issues:repo:a_b:30d", "2".into(), None).await.unwrap();
        backend.set_raw("health:score", "3".into(), None).await.unwrap();

        let mut keys = backend.keys("issues:").await.unwrap();
        keys.sort();
        assert_eq!(keys, ["issues:overview:30d", "issues:repo:a_b:30d"]);
    }

    #[tokio::test]
    async fn del_removes_entry() {
        let backend = MemoryBackend::new();
        backend.set_raw("k", "1".into(), None).await.unwrap();
        backend.del("k").await.unwrap();
        assert_eq!(backend.get_raw("k").await.unwrap(), None);
    }
}
