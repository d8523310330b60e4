use iroh::Endpoint;

use super::client::list_buckets;
use crate::bucket::Bucket;
use crate::controller::{Controller, ControllerError};
use crate::crypto::PublicKey;
use crate::source::SourceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Buckets that were absent or older locally
    pub saved: usize,
    pub skipped: usize,
    /// Peers that could not be listed, or buckets that could not be saved
    pub failed: usize,
}

/// Save every bucket that is unknown locally or newer than the local copy.
pub async fn merge_buckets(controller: &Controller, buckets: Vec<Bucket>) -> SyncReport {
    let mut report = SyncReport::default();
    for bucket in buckets {
        let hash = bucket.hash();
        match controller.load_bucket(&hash).await {
            Ok(local) if local.updated() >= bucket.updated() => {
                report.skipped += 1;
                continue;
            }
            Ok(_) | Err(ControllerError::Source(SourceError::NotFound(_))) => {}
            Err(e) => {
                tracing::warn!(%hash, "failed to load local bucket: {}", e);
                report.failed += 1;
                continue;
            }
        }
        match controller.save_signed_bucket(&bucket).await {
            Ok(()) => report.saved += 1,
            Err(e) => {
                tracing::warn!(%hash, "failed to save pulled bucket: {}", e);
                report.failed += 1;
            }
        }
    }
    report
}

/// Pull the bucket lists of `peers` into the local registry.
pub async fn pull_buckets(
    endpoint: &Endpoint,
    controller: &Controller,
    peers: &[PublicKey],
) -> SyncReport {
    let mut report = SyncReport::default();
    for peer in peers {
        match list_buckets(endpoint, peer).await {
            Ok(buckets) => {
                let merged = merge_buckets(controller, buckets).await;
                report.saved += merged.saved;
                report.skipped += merged.skipped;
                report.failed += merged.failed;
            }
            Err(e) => {
                tracing::warn!(peer = %peer.to_hex(), "failed to list buckets: {}", e);
                report.failed += 1;
            }
        }
    }
    tracing::debug!(?report, "bucket pull finished");
    report
}
