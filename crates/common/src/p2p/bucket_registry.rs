use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};

use super::P2P_SOURCE;
use crate::bucket::{parse_bucket, serialize_bucket, Bucket};
use crate::pointer::BUCKET_PREFIX;
use crate::source::{BucketRegistry, ReplicatedMap, SourceError};

/// Default number of serialized buckets kept in the local cache
pub const DEFAULT_CACHE_CAPACITY: u64 = 128;

/// When a saved bucket enters the local cache relative to the replicated write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Cache first, then write. A failed write leaves the cache ahead of the
    /// map until the entry is evicted; readers still re-verify.
    #[default]
    CacheBeforeConfirm,
    /// Cache only once the replicated write has succeeded.
    WriteThrough,
}

pub fn bucket_key(hash: &str) -> String {
    format!("{}{}", BUCKET_PREFIX, hash)
}

/// Bucket registry over a replicated map, fronted by a bounded LRU cache of
/// serialized buckets.
#[derive(Clone)]
pub struct P2PBucketRegistry {
    map: Arc<dyn ReplicatedMap>,
    cache: Cache<String, Vec<u8>>,
    policy: WritePolicy,
}

impl std::fmt::Debug for P2PBucketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P2PBucketRegistry")
            .field("map", &self.map)
            .field("cached", &self.cache.entry_count())
            .field("policy", &self.policy)
            .finish()
    }
}

impl P2PBucketRegistry {
    pub fn new(map: Arc<dyn ReplicatedMap>, capacity: u64, policy: WritePolicy) -> Self {
        Self {
            map,
            cache: Cache::builder().max_capacity(capacity).build(),
            policy,
        }
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    fn cache_optimistically(&self, hash: &str, raw: Vec<u8>) {
        self.cache.insert(hash.to_string(), raw);
    }

    async fn get(&self, hash: &str) -> Result<Option<Vec<u8>>, SourceError> {
        if let Some(raw) = self.cache.get(hash) {
            return Ok(Some(raw));
        }
        let raw = self.map.get(&bucket_key(hash)).await?;
        if let Some(raw) = &raw {
            self.cache.insert(hash.to_string(), raw.clone());
        }
        Ok(raw)
    }
}

#[async_trait]
impl BucketRegistry for P2PBucketRegistry {
    fn id(&self) -> &str {
        P2P_SOURCE
    }

    async fn has(&self, hash: &str) -> Result<bool, SourceError> {
        if self.cache.contains_key(hash) {
            return Ok(true);
        }
        Ok(self.map.has(&bucket_key(hash)).await?)
    }

    async fn save(&self, bucket: &Bucket) -> Result<(), SourceError> {
        bucket.verify().map_err(|e| {
            tracing::warn!(name = bucket.name(), "refusing to save unverified bucket: {}", e);
            e
        })?;
        let hash = bucket.hash();
        let raw = serialize_bucket(bucket)?;
        let key = bucket_key(&hash);

        match self.policy {
            WritePolicy::CacheBeforeConfirm => {
                self.cache_optimistically(&hash, raw.clone());
                self.map.put(&key, raw).await?;
            }
            WritePolicy::WriteThrough => {
                self.map.put(&key, raw.clone()).await?;
                self.cache.insert(hash.clone(), raw);
            }
        }

        tracing::debug!(%hash, updated = bucket.updated(), "bucket saved");
        Ok(())
    }

    async fn load(&self, hash: &str) -> Result<Bucket, SourceError> {
        if !self.has(hash).await? {
            return Err(SourceError::NotFound(hash.to_string()));
        }
        let raw = self
            .get(hash)
            .await?
            .ok_or_else(|| SourceError::NotFound(hash.to_string()))?;
        Ok(parse_bucket(hash, &raw)?)
    }

    async fn for_each(
        &self,
        visitor: &mut (dyn FnMut(&str, Bucket) -> bool + Send),
    ) -> Result<(), SourceError> {
        let entries = self.map.query(BUCKET_PREFIX).await?;
        for (key, raw) in entries {
            let hash = key.strip_prefix(BUCKET_PREFIX).unwrap_or(&key);
            let bucket = parse_bucket(hash, &raw).map_err(|e| {
                tracing::error!(%key, "aborting bucket iteration on bad entry: {}", e);
                e
            })?;
            if !visitor(hash, bucket) {
                break;
            }
        }
        Ok(())
    }
}
