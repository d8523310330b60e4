use std::fmt::Debug;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("replicated map unavailable: {0}")]
    Unavailable(String),
    #[error("replicated map internal error: {0}")]
    Internal(String),
}

/// An eventually consistent key-value map shared by every peer.
///
/// Writes become visible to other peers once the replicas converge; the
/// map itself gives no ordering guarantee between writers.
#[async_trait]
pub trait ReplicatedMap: Send + Sync + Debug + 'static {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), MapError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MapError>;

    async fn has(&self, key: &str) -> Result<bool, MapError>;

    /// All entries whose key starts with `prefix`, in key order.
    async fn query(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, MapError>;
}
