use bytes::Bytes;

use crate::linked_data::ContentId;
use crate::peer::{BlobFetcher, BlobsStore};
use crate::source::SourceError;

/// The blobs store as seen by the p2p sources: reads of blobs that are not
/// present locally go through the fetcher first.
#[derive(Clone, Debug)]
pub struct BlockStore {
    blobs: BlobsStore,
    fetcher: Option<BlobFetcher>,
}

impl BlockStore {
    pub fn new(blobs: BlobsStore, fetcher: Option<BlobFetcher>) -> Self {
        Self { blobs, fetcher }
    }

    /// A store that only ever reads local blobs.
    pub fn local(blobs: BlobsStore) -> Self {
        Self::new(blobs, None)
    }

    pub fn blobs(&self) -> &BlobsStore {
        &self.blobs
    }

    /// Fail with [`SourceError::NotFound`] unless `cid` is, or can be made,
    /// available locally.
    pub async fn ensure_local(&self, cid: &ContentId) -> Result<(), SourceError> {
        let hash = cid.hash();
        if self.blobs.has(hash).await? {
            return Ok(());
        }
        if let Some(fetcher) = &self.fetcher {
            fetcher.fetch(&self.blobs, hash).await?;
            if self.blobs.has(hash).await? {
                return Ok(());
            }
        }
        Err(SourceError::NotFound(cid.to_string()))
    }

    pub async fn get(&self, cid: &ContentId) -> Result<Bytes, SourceError> {
        self.ensure_local(cid).await?;
        Ok(self.blobs.read(cid.hash()).await?)
    }

    pub async fn put(&self, data: Vec<u8>) -> Result<ContentId, SourceError> {
        Ok(self.blobs.import(data).await?.into())
    }
}
