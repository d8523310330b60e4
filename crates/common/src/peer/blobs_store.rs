use std::future::IntoFuture;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use iroh::{Endpoint, NodeId};
use iroh_blobs::api::blobs::{BlobReader, BlobStatus, Blobs};
use iroh_blobs::api::downloader::{Downloader, Shuffled};
use iroh_blobs::api::RequestError;
use iroh_blobs::store::{fs::FsStore, mem::MemStore};
use iroh_blobs::{BlobsProtocol, Hash};

use crate::crypto::PublicKey;

/// Every byte a node holds, file content and directory nodes alike,
/// addressed by its BLAKE3 hash.
///
/// The router serves the iroh-blobs ALPN straight from this store, so a
/// peer that holds a blob can hand it on to the next one.
#[derive(Clone, Debug)]
pub struct BlobsStore {
    protocol: Arc<BlobsProtocol>,
}

#[derive(Debug, thiserror::Error)]
pub enum BlobsStoreError {
    #[error("blob store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob request failed: {0}")]
    Request(#[from] RequestError),
    #[error("blob store: {0}")]
    Store(String),
    #[error("no provider delivered blob {0}")]
    Unavailable(Hash),
}

impl BlobsStore {
    /// Persistent store under `path`.
    pub async fn fs(path: &Path) -> Result<Self, BlobsStoreError> {
        tracing::debug!(?path, "opening blobs store");
        let store = FsStore::load(path)
            .await
            .map_err(|e| BlobsStoreError::Store(e.to_string()))?;
        Ok(Self::wrap(BlobsProtocol::new(&store, None)))
    }

    pub async fn memory() -> Result<Self, BlobsStoreError> {
        Ok(Self::wrap(BlobsProtocol::new(&MemStore::new(), None)))
    }

    fn wrap(protocol: BlobsProtocol) -> Self {
        Self {
            protocol: Arc::new(protocol),
        }
    }

    /// The iroh-blobs protocol handler for the router.
    pub fn protocol(&self) -> Arc<BlobsProtocol> {
        self.protocol.clone()
    }

    fn blobs(&self) -> &Blobs {
        self.protocol.store().blobs()
    }

    pub async fn read(&self, hash: Hash) -> Result<Bytes, BlobsStoreError> {
        Ok(self.blobs().get_bytes(hash).await?)
    }

    /// Streaming reader over a complete local blob.
    pub fn open(&self, hash: Hash) -> BlobReader {
        self.blobs().reader(hash)
    }

    pub async fn import(&self, data: Vec<u8>) -> Result<Hash, BlobsStoreError> {
        let tag = self.blobs().add_bytes(data).into_future().await?;
        Ok(tag.hash)
    }

    pub async fn import_stream<S>(&self, stream: S) -> Result<Hash, BlobsStoreError>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + Sync + Unpin + 'static,
    {
        let tag = self
            .blobs()
            .add_stream(stream)
            .into_future()
            .await
            .with_tag()
            .await?;
        Ok(tag.hash)
    }

    /// True once every chunk of `hash` is stored locally.
    pub async fn has(&self, hash: Hash) -> Result<bool, BlobsStoreError> {
        let status = self
            .blobs()
            .status(hash)
            .await
            .map_err(|e| BlobsStoreError::Store(e.to_string()))?;
        Ok(matches!(status, BlobStatus::Complete { .. }))
    }

    /// Download `hash` from whichever of `providers` answers first.
    pub async fn pull(
        &self,
        hash: Hash,
        providers: &[PublicKey],
        endpoint: &Endpoint,
    ) -> Result<(), BlobsStoreError> {
        if self.has(hash).await? {
            return Ok(());
        }

        tracing::info!(%hash, providers = providers.len(), "pulling blob");
        let nodes: Vec<NodeId> = providers.iter().map(|p| NodeId::from(*p)).collect();
        let downloader = Downloader::new(self.protocol.store(), endpoint);
        if let Err(e) = downloader.download(hash, Shuffled::new(nodes)).await {
            tracing::warn!(%hash, "blob download failed: {}", e);
            return Err(BlobsStoreError::Store(e.to_string()));
        }

        if !self.has(hash).await? {
            return Err(BlobsStoreError::Unavailable(hash));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_store_keeps_content() {
        let dir = TempDir::new().unwrap();
        let store = BlobsStore::fs(&dir.path().join("blobs")).await.unwrap();
        let hash = store.import(b"bucket listing".to_vec()).await.unwrap();
        assert_eq!(store.read(hash).await.unwrap().as_ref(), b"bucket listing");
    }

    #[tokio::test]
    async fn test_stream_and_bytes_share_an_address() {
        let store = BlobsStore::memory().await.unwrap();
        let chunks = vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"first ")),
            Ok(Bytes::from_static(b"second")),
        ];
        let streamed = store.import_stream(stream::iter(chunks)).await.unwrap();
        let whole = store.import(b"first second".to_vec()).await.unwrap();
        assert_eq!(streamed, whole);
    }

    #[tokio::test]
    async fn test_has_and_missing_read() {
        let store = BlobsStore::memory().await.unwrap();
        let hash = store.import(b"present".to_vec()).await.unwrap();
        assert!(store.has(hash).await.unwrap());

        let missing = Hash::from_bytes([7u8; 32]);
        assert!(!store.has(missing).await.unwrap());
        assert!(store.read(missing).await.is_err());
    }
}
