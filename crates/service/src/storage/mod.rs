//! Storage abstractions for the service layer
//!
//! The version tree needs four primitives from its backend: set insertion,
//! set listing, string get and string set. `KvBackend` is that surface;
//! `RedisStore` is the production implementation and `MemoryStore` backs
//! tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use configs::{AppConfig, StorageBackend};
use thiserror::Error;
use tracing::{error, info};

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend connection error: {0}")]
    Connection(String),
    #[error("backend command error: {0}")]
    Command(String),
}

/// Flat key-value backend with set and string values.
///
/// Absent keys are not errors: an absent set lists as empty and an absent
/// string reads as `None`.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Add `member` to the set at `set_key`; adding an existing member is a no-op.
    async fn add_member(&self, set_key: &str, member: &str) -> Result<(), StoreError>;
    /// All members of the set at `set_key`, in no particular order.
    async fn list_members(&self, set_key: &str) -> Result<Vec<String>, StoreError>;
    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Build the backend selected by `cfg.storage`, once per process.
///
/// A Redis backend that fails its startup probe is still returned; requests
/// will then report the backend error instead of the process refusing to start.
pub async fn open_backend(cfg: &AppConfig) -> Result<Arc<dyn KvBackend>, StoreError> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            info!(event = "storage_open", backend = "memory", "using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Redis => {
            let store = RedisStore::connect(&cfg.redis)?;
            match store.ping().await {
                Ok(()) => info!(
                    event = "storage_open",
                    backend = "redis",
                    addr = %store.addr(),
                    "Connected to redis server on address {}",
                    store.addr()
                ),
                Err(e) => error!(
                    event = "storage_probe_failed",
                    backend = "redis",
                    addr = %store.addr(),
                    error = %e,
                    "redis not reachable at startup"
                ),
            }
            Ok(Arc::new(store))
        }
    }
}
