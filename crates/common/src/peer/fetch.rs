use std::sync::Arc;

use iroh::Endpoint;
use iroh_blobs::Hash;
use parking_lot::RwLock;

use super::{BlobsStore, BlobsStoreError};
use crate::crypto::PublicKey;

/// Pulls blobs that a replicated bucket references but this peer does not
/// hold yet, from a set of provider peers.
#[derive(Clone, Debug)]
pub struct BlobFetcher {
    endpoint: Endpoint,
    providers: Arc<RwLock<Vec<PublicKey>>>,
}

impl BlobFetcher {
    pub fn new(endpoint: Endpoint, providers: Vec<PublicKey>) -> Self {
        Self {
            endpoint,
            providers: Arc::new(RwLock::new(providers)),
        }
    }

    pub fn add_provider(&self, provider: PublicKey) {
        let mut providers = self.providers.write();
        if !providers.contains(&provider) {
            providers.push(provider);
        }
    }

    pub fn providers(&self) -> Vec<PublicKey> {
        self.providers.read().clone()
    }

    /// Make `hash` available in `blobs`, downloading it if needed.
    pub async fn fetch(&self, blobs: &BlobsStore, hash: Hash) -> Result<(), BlobsStoreError> {
        let providers = self.providers();
        if providers.is_empty() {
            tracing::debug!(%hash, "no providers configured, not fetching");
            return Ok(());
        }
        blobs.pull(hash, &providers, &self.endpoint).await
    }
}
