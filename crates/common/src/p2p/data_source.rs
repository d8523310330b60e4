use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use super::store::BlockStore;
use super::P2P_SOURCE;
use crate::linked_data::ContentId;
use crate::source::{ByteStream, DataReader, DataSource, SourceError, StoredData};

/// File content stored as iroh blobs.
#[derive(Debug, Clone)]
pub struct P2PDataSource {
    store: BlockStore,
}

impl P2PDataSource {
    pub fn new(store: BlockStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DataSource for P2PDataSource {
    fn id(&self) -> &str {
        P2P_SOURCE
    }

    async fn add(&self, stream: ByteStream) -> Result<StoredData, SourceError> {
        let size = Arc::new(AtomicU64::new(0));
        let counter = size.clone();
        let counted = stream.inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                counter.fetch_add(bytes.len() as u64, Ordering::Relaxed);
            }
        });

        let hash = self.store.blobs().import_stream(counted).await?;
        let stored = StoredData {
            cid: hash.into(),
            size: size.load(Ordering::Relaxed),
        };
        tracing::debug!(cid = %stored.cid, size = stored.size, "stored data");
        Ok(stored)
    }

    async fn get(&self, cid: &ContentId) -> Result<DataReader, SourceError> {
        self.store.ensure_local(cid).await?;
        let reader = self.store.blobs().open(cid.hash());
        Ok(Box::pin(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::BlobsStore;
    use bytes::Bytes;
    use futures::stream;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_add_counts_and_reads_back() {
        let blobs = BlobsStore::memory().await.unwrap();
        let src = P2PDataSource::new(BlockStore::local(blobs));
        let chunks = vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let stored = src.add(Box::pin(stream::iter(chunks))).await.unwrap();
        assert_eq!(stored.size, 11);

        let mut reader = src.get(&stored.cid).await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let blobs = BlobsStore::memory().await.unwrap();
        let src = P2PDataSource::new(BlockStore::local(blobs));
        let result = src.get(&ContentId::from_bytes([7u8; 32])).await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }
}
