use std::sync::Arc;

use async_trait::async_trait;

use crate::bucket::{parse_domain_record, serialize_domain_record, DomainRecord};
use crate::source::{DomainRegistry, ReplicatedMap, SourceError};

pub const DOMAIN_PREFIX: &str = "/domain/";

pub fn domain_key(domain: &str) -> String {
    format!("{}{}", DOMAIN_PREFIX, domain.trim_matches('/'))
}

/// Domain registry sharing the replicated map with the bucket registry.
#[derive(Debug, Clone)]
pub struct P2PDomainRegistry {
    map: Arc<dyn ReplicatedMap>,
}

impl P2PDomainRegistry {
    pub fn new(map: Arc<dyn ReplicatedMap>) -> Self {
        Self { map }
    }
}

#[async_trait]
impl DomainRegistry for P2PDomainRegistry {
    async fn register(&self, record: &DomainRecord) -> Result<(), SourceError> {
        let key = domain_key(record.domain());
        if self.map.has(&key).await? {
            return Err(SourceError::AlreadyExists(record.domain().to_string()));
        }
        record.verify()?;
        let raw = serialize_domain_record(record)?;
        self.map.put(&key, raw).await?;
        tracing::debug!(domain = record.domain(), hash = record.hash(), "domain registered");
        Ok(())
    }

    async fn resolve(&self, domain: &str) -> Result<DomainRecord, SourceError> {
        let raw = self
            .map
            .get(&domain_key(domain))
            .await?
            .ok_or_else(|| SourceError::NotFound(domain.to_string()))?;
        Ok(parse_domain_record(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;
    use crate::p2p::MemoryReplicatedMap;

    fn signed(domain: &str, key: &SecretKey) -> DomainRecord {
        let mut record = DomainRecord::new("abcd", domain, &key.public());
        record.sign(key).unwrap();
        record
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let registry = P2PDomainRegistry::new(Arc::new(MemoryReplicatedMap::new()));
        let key = SecretKey::generate();
        let record = signed("photos", &key);
        registry.register(&record).await.unwrap();
        assert_eq!(registry.resolve("photos").await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_domain_registers_once() {
        let registry = P2PDomainRegistry::new(Arc::new(MemoryReplicatedMap::new()));
        registry
            .register(&signed("photos", &SecretKey::generate()))
            .await
            .unwrap();
        let second = registry
            .register(&signed("photos", &SecretKey::generate()))
            .await;
        assert!(matches!(second, Err(SourceError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_unsigned_record_is_refused() {
        let map = MemoryReplicatedMap::new();
        let registry = P2PDomainRegistry::new(Arc::new(map.clone()));
        let record = DomainRecord::new("abcd", "photos", &SecretKey::generate().public());
        assert!(registry.register(&record).await.is_err());
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown() {
        let registry = P2PDomainRegistry::new(Arc::new(MemoryReplicatedMap::new()));
        assert!(matches!(
            registry.resolve("nope").await,
            Err(SourceError::NotFound(_))
        ));
    }
}
