use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::store::BlockStore;
use super::P2P_SOURCE;
use crate::bucket::DataRef;
use crate::linked_data::ContentId;
use crate::source::{BucketSource, SourceError};

/// A directory node: file name to the id of its `DataRef` leaf.
///
/// Stored as DAG-CBOR in the blobs store, so its id is its content hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub links: BTreeMap<String, ContentId>,
}

impl Directory {
    pub fn encode(&self) -> Result<Vec<u8>, SourceError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| SourceError::Codec(e.to_string()))
    }

    pub fn decode(raw: &[u8]) -> Result<Self, SourceError> {
        serde_ipld_dagcbor::from_slice(raw).map_err(|e| SourceError::Codec(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct P2PBucketSource {
    store: BlockStore,
}

impl P2PBucketSource {
    pub fn new(store: BlockStore) -> Self {
        Self { store }
    }

    async fn load(&self, root: &ContentId) -> Result<Directory, SourceError> {
        let raw = self.store.get(root).await?;
        Directory::decode(&raw)
    }

    async fn store(&self, dir: &Directory) -> Result<ContentId, SourceError> {
        self.store.put(dir.encode()?).await
    }
}

#[async_trait]
impl BucketSource for P2PBucketSource {
    fn id(&self) -> &str {
        P2P_SOURCE
    }

    async fn new_bucket(&self) -> Result<ContentId, SourceError> {
        self.store(&Directory::default()).await
    }

    async fn add_child(
        &self,
        root: &ContentId,
        name: &str,
        data_ref: &DataRef,
    ) -> Result<ContentId, SourceError> {
        let mut dir = self.load(root).await?;
        let leaf = self.store.put(data_ref.to_bytes()?).await?;
        dir.links.remove(name);
        dir.links.insert(name.to_string(), leaf);
        let new_root = self.store(&dir).await?;
        tracing::debug!(%root, %new_root, name, "linked child");
        Ok(new_root)
    }

    async fn remove_child(&self, root: &ContentId, name: &str) -> Result<ContentId, SourceError> {
        let mut dir = self.load(root).await?;
        if dir.links.remove(name).is_none() {
            return Err(SourceError::NotFound(name.to_string()));
        }
        self.store(&dir).await
    }

    async fn get_child(&self, root: &ContentId, name: &str) -> Result<DataRef, SourceError> {
        let dir = self.load(root).await?;
        let leaf = dir
            .links
            .get(name)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))?;
        let raw = self.store.get(leaf).await?;
        Ok(DataRef::from_bytes(&raw)?)
    }

    async fn get_names(&self, root: &ContentId) -> Result<Vec<String>, SourceError> {
        let dir = self.load(root).await?;
        Ok(dir.links.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::FileHeader;
    use crate::peer::BlobsStore;

    async fn source() -> P2PBucketSource {
        let blobs = BlobsStore::memory().await.unwrap();
        P2PBucketSource::new(BlockStore::local(blobs))
    }

    fn data_ref(name: &str, fill: u8) -> DataRef {
        DataRef::new(
            ContentId::from_bytes([fill; 32]),
            P2P_SOURCE,
            FileHeader::new(name, "text/plain"),
        )
    }

    #[tokio::test]
    async fn test_new_bucket_is_empty() {
        let src = source().await;
        let root = src.new_bucket().await.unwrap();
        assert!(src.get_names(&root).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_get_child() {
        let src = source().await;
        let root = src.new_bucket().await.unwrap();
        let dr = data_ref("a.txt", 1);
        let root2 = src.add_child(&root, "a.txt", &dr).await.unwrap();

        assert_ne!(root, root2);
        assert_eq!(src.get_child(&root2, "a.txt").await.unwrap(), dr);
        assert_eq!(src.get_names(&root2).await.unwrap(), vec!["a.txt"]);
        // the old root is untouched
        assert!(src.get_names(&root).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_child_replaces_same_name() {
        let src = source().await;
        let root = src.new_bucket().await.unwrap();
        let root = src.add_child(&root, "a", &data_ref("a", 1)).await.unwrap();
        let root = src.add_child(&root, "a", &data_ref("a", 2)).await.unwrap();

        assert_eq!(src.get_names(&root).await.unwrap(), vec!["a"]);
        assert_eq!(
            src.get_child(&root, "a").await.unwrap().cid,
            ContentId::from_bytes([2u8; 32])
        );
    }

    #[tokio::test]
    async fn test_remove_child() {
        let src = source().await;
        let root = src.new_bucket().await.unwrap();
        let root = src.add_child(&root, "a", &data_ref("a", 1)).await.unwrap();
        let root = src.add_child(&root, "b", &data_ref("b", 2)).await.unwrap();
        let root = src.remove_child(&root, "a").await.unwrap();

        assert_eq!(src.get_names(&root).await.unwrap(), vec!["b"]);
        assert!(matches!(
            src.remove_child(&root, "a").await,
            Err(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_child_and_root() {
        let src = source().await;
        let root = src.new_bucket().await.unwrap();
        assert!(matches!(
            src.get_child(&root, "nope").await,
            Err(SourceError::NotFound(_))
        ));
        let unknown = ContentId::from_bytes([42u8; 32]);
        assert!(matches!(
            src.get_names(&unknown).await,
            Err(SourceError::NotFound(_))
        ));
    }
}
