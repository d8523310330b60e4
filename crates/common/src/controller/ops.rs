//! Bucket operations expressed purely over the registry and source traits.

use super::{BucketFilter, ControllerError, Visit};
use crate::bucket::{bucket_hash, Bucket, DataRef};
use crate::crypto::PublicKey;
use crate::source::{BucketRegistry, BucketSource};

/// Build an unsigned bucket over a fresh empty directory.
///
/// Fails with [`ControllerError::AlreadyExists`] when `owner` already has a
/// bucket named `name`.
pub async fn create_bucket(
    registry: &dyn BucketRegistry,
    source: &dyn BucketSource,
    name: &str,
    owner: &PublicKey,
) -> Result<Bucket, ControllerError> {
    let hash = bucket_hash(name, &owner.to_bytes());
    if registry.has(&hash).await? {
        return Err(ControllerError::AlreadyExists(hash));
    }
    let root = source.new_bucket().await?;
    Ok(Bucket::new(name, owner, root)?)
}

/// Load the bucket and link `data_ref` into its directory under the file
/// name. The returned bucket points at the new root and must be re-signed.
pub async fn add_to_bucket(
    registry: &dyn BucketRegistry,
    source: &dyn BucketSource,
    hash: &str,
    data_ref: &DataRef,
) -> Result<Bucket, ControllerError> {
    let mut bucket = registry.load(hash).await?;
    let root = *bucket.node();
    let new_root = source
        .add_child(&root, &data_ref.header.filename, data_ref)
        .await?;
    if !bucket.swap_node(&root, new_root) {
        return Err(ControllerError::CouldNotUpdateBucketNode);
    }
    Ok(bucket)
}

/// Load the bucket and unlink `name` from its directory.
pub async fn remove_from_bucket(
    registry: &dyn BucketRegistry,
    source: &dyn BucketSource,
    hash: &str,
    name: &str,
) -> Result<Bucket, ControllerError> {
    let mut bucket = registry.load(hash).await?;
    let root = *bucket.node();
    let new_root = source.remove_child(&root, name).await?;
    if !bucket.swap_node(&root, new_root) {
        return Err(ControllerError::CouldNotUpdateBucketNode);
    }
    Ok(bucket)
}

/// Collect registered buckets. Without a filter every bucket is kept.
pub async fn list_buckets(
    registry: &dyn BucketRegistry,
    mut filter: Option<BucketFilter<'_>>,
) -> Result<Vec<Bucket>, ControllerError> {
    let mut buckets = Vec::new();
    registry
        .for_each(&mut |_hash: &str, bucket: Bucket| {
            let visit = match filter.as_mut() {
                Some(filter) => filter(&bucket),
                None => Visit::Keep,
            };
            match visit {
                Visit::Keep => {
                    buckets.push(bucket);
                    true
                }
                Visit::Skip => true,
                Visit::Stop => false,
            }
        })
        .await?;
    Ok(buckets)
}
