//! Ecopulse Persisted Store
//!
//! Key-value cache holding the latest computed snapshots. The pipeline
//! writes best-effort; the dashboard API only ever reads from here.

mod memory;
mod models;
mod redis_backend;

pub mod keys;

pub use memory::MemoryBackend;
pub use models::*;
pub use redis_backend::RedisBackend;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Raw string-valued key-value backend with optional per-key TTL.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;
    async fn set_raw(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> Result<()>;
    async fn del(&self, key: &str) -> Result<()>;
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Typed store handle shared across the pipeline and the API.
///
/// All operations degrade instead of failing: a broken backend or a
/// malformed persisted value surfaces as `None` on read and as a logged
/// warning on write. The refresh pipeline must never abort because the
/// cache is unhappy.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvBackend>,
}

impl Store {
    /// In-process map backend, used when no external cache is configured.
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    /// Redis-backed store for deployments with a managed cache.
    pub fn redis(url: &str) -> Result<Self> {
        Ok(Self {
            backend: Arc::new(RedisBackend::new(url)?),
        })
    }

    /// Select a backend once at process start: Redis when `REDIS_URL` is
    /// set, otherwise the in-memory fallback.
    pub fn from_env() -> Self {
        match std::env::var("REDIS_URL") {
            Ok(url) => match Self::redis(&url) {
                Ok(store) => {
                    info!("Store backend: redis");
                    store
                }
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, falling back to in-memory store");
                    Self::memory()
                }
            },
            Err(_) => {
                info!("Store backend: in-memory (REDIS_URL not set)");
                Self::memory()
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_raw(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = key, error = %e, "Store get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                // Malformed persisted data is treated as a cache miss.
                warn!(key = key, error = %e, "Rejecting malformed persisted value");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, None).await;
    }

    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = key, error = %e, "Store set skipped: serialization failed");
                return;
            }
        };

        if let Err(e) = self.backend.set_raw(key, raw, ttl_seconds).await {
            warn!(key = key, error = %e, "Store set failed");
        }
    }

    pub async fn del(&self, key: &str) {
        if let Err(e) = self.backend.del(key).await {
            warn!(key = key, error = %e, "Store del failed");
        }
    }

    pub async fn keys(&self, prefix: &str) -> Vec<String> {
        match self.backend.keys(prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(prefix = prefix, error = %e, "Store keys failed");
                Vec::new()
            }
        }
    }
}
