use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::source::{MapError, ReplicatedMap};

/// In-process replicated map.
///
/// Clones share the same entries, so several peers in one process that hold
/// clones observe each other's writes immediately, as converged replicas would.
#[derive(Debug, Clone, Default)]
pub struct MemoryReplicatedMap {
    inner: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryReplicatedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> MapError {
    MapError::Internal(format!("failed to acquire lock: {}", e))
}

#[async_trait]
impl ReplicatedMap for MemoryReplicatedMap {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), MapError> {
        let mut entries = self.inner.write().map_err(lock_error)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MapError> {
        let entries = self.inner.read().map_err(lock_error)?;
        Ok(entries.get(key).cloned())
    }

    async fn has(&self, key: &str) -> Result<bool, MapError> {
        let entries = self.inner.read().map_err(lock_error)?;
        Ok(entries.contains_key(key))
    }

    async fn query(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, MapError> {
        let entries = self.inner.read().map_err(lock_error)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
