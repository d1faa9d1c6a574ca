use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KvBackend, StoreError};

#[derive(Debug, Clone)]
enum Entry {
    Set(HashSet<String>),
    Str(String),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Set(_) => "set",
            Entry::Str(_) => "string",
        }
    }
}

fn wrong_type(key: &str, found: &Entry) -> StoreError {
    StoreError::Command(format!("WRONGTYPE key {key:?} holds a {}", found.kind()))
}

/// In-process backend with Redis semantics for the four primitives.
///
/// Like Redis, a key holds exactly one kind of value; using a set key as a
/// string (or the reverse) is a command error.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl KvBackend for MemoryStore {
    async fn add_member(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        match map
            .entry(set_key.to_string())
            .or_insert_with(|| Entry::Set(HashSet::new()))
        {
            Entry::Set(set) => {
                set.insert(member.to_string());
                Ok(())
            }
            other => Err(wrong_type(set_key, other)),
        }
    }

    async fn list_members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let map = self.inner.read().await;
        match map.get(set_key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type(set_key, other)),
        }
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.inner.read().await;
        match map.get(key) {
            None => Ok(None),
            Some(Entry::Str(v)) => Ok(Some(v.clone())),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // SET overwrites whatever the key held
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), Entry::Str(value.to_string()));
        Ok(())
    }
}
