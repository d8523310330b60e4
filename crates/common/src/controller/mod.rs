use std::sync::Arc;

mod ops;

pub use ops::{add_to_bucket, create_bucket, list_buckets, remove_from_bucket};

use crate::bucket::{Bucket, BucketError, DataRef, FileHeader};
use crate::crypto::SecretKey;
use crate::source::{
    BucketRegistry, BucketSource, ByteStream, DataReader, DataSource, SourceError,
};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("bucket already exists: {0}")]
    AlreadyExists(String),
    #[error("could not find bucket hash: {0}")]
    BucketNotExist(String),
    #[error("could not update bucket ref node")]
    CouldNotUpdateBucketNode,
    #[error("bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// What to do with a bucket visited while listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    Skip,
    /// Stop listing, without keeping this bucket
    Stop,
}

pub type BucketFilter<'a> = &'a mut (dyn FnMut(&Bucket) -> Visit + Send);

/// Entry point for every bucket operation a peer performs.
///
/// Holds the peer's identity and one registry, bucket source and data
/// source. Operations that sign take an optional key and fall back to the
/// identity. Mutations are read-modify-write against the registry with no
/// compare-and-swap: two concurrent uploads into the same bucket can race
/// and the later commit wins.
#[derive(Clone, Debug)]
pub struct Controller {
    identity: SecretKey,
    registry: Arc<dyn BucketRegistry>,
    bucket_source: Arc<dyn BucketSource>,
    data_source: Arc<dyn DataSource>,
}

impl Controller {
    pub fn new(
        identity: SecretKey,
        registry: Arc<dyn BucketRegistry>,
        bucket_source: Arc<dyn BucketSource>,
        data_source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            identity,
            registry,
            bucket_source,
            data_source,
        }
    }

    pub fn identity(&self) -> &SecretKey {
        &self.identity
    }

    pub fn registry(&self) -> &Arc<dyn BucketRegistry> {
        &self.registry
    }

    pub fn bucket_source(&self) -> &Arc<dyn BucketSource> {
        &self.bucket_source
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    fn key<'a>(&'a self, key: Option<&'a SecretKey>) -> &'a SecretKey {
        key.unwrap_or(&self.identity)
    }

    /// Create, sign and persist a new empty bucket owned by `key`.
    pub async fn create_bucket(
        &self,
        name: &str,
        key: Option<&SecretKey>,
    ) -> Result<Bucket, ControllerError> {
        let key = self.key(key);
        let mut bucket = create_bucket(
            self.registry.as_ref(),
            self.bucket_source.as_ref(),
            name,
            &key.public(),
        )
        .await?;
        self.commit(&mut bucket, Some(key)).await?;
        tracing::info!(hash = %bucket.hash(), name, "bucket created");
        Ok(bucket)
    }

    /// Sign and persist. Nothing is written if signing fails.
    pub async fn commit(
        &self,
        bucket: &mut Bucket,
        key: Option<&SecretKey>,
    ) -> Result<(), ControllerError> {
        bucket.sign(self.key(key))?;
        self.registry.save(bucket).await?;
        Ok(())
    }

    /// Store `stream` and link it into bucket `hash` under the header's file name.
    pub async fn upload(
        &self,
        hash: &str,
        header: FileHeader,
        stream: ByteStream,
        key: Option<&SecretKey>,
    ) -> Result<DataRef, ControllerError> {
        if !self.registry.has(hash).await? {
            return Err(ControllerError::BucketNotExist(hash.to_string()));
        }
        if header.filename.is_empty() {
            return Err(BucketError::BadInput("file name cannot be empty".into()).into());
        }
        let data_ref = self.upload_data(header, stream).await?;
        let mut bucket = add_to_bucket(
            self.registry.as_ref(),
            self.bucket_source.as_ref(),
            hash,
            &data_ref,
        )
        .await?;
        self.commit(&mut bucket, key).await?;
        tracing::info!(
            %hash,
            name = %data_ref.header.filename,
            size = data_ref.header.size,
            "uploaded into bucket"
        );
        Ok(data_ref)
    }

    /// Unlink `name` from bucket `hash` and re-commit it.
    pub async fn remove(
        &self,
        hash: &str,
        name: &str,
        key: Option<&SecretKey>,
    ) -> Result<Bucket, ControllerError> {
        if !self.registry.has(hash).await? {
            return Err(ControllerError::BucketNotExist(hash.to_string()));
        }
        let mut bucket = remove_from_bucket(
            self.registry.as_ref(),
            self.bucket_source.as_ref(),
            hash,
            name,
        )
        .await?;
        self.commit(&mut bucket, key).await?;
        Ok(bucket)
    }

    /// Store content outside of any bucket.
    pub async fn upload_data(
        &self,
        mut header: FileHeader,
        stream: ByteStream,
    ) -> Result<DataRef, ControllerError> {
        let stored = self.data_source.add(stream).await?;
        header.size = stored.size;
        Ok(DataRef::new(stored.cid, self.data_source.id(), header))
    }

    pub async fn download(
        &self,
        hash: &str,
        name: &str,
    ) -> Result<(DataReader, DataRef), ControllerError> {
        let bucket = self.registry.load(hash).await?;
        let data_ref = self.bucket_source.get_child(bucket.node(), name).await?;
        let reader = self.data_source.get(&data_ref.cid).await?;
        Ok((reader, data_ref))
    }

    pub async fn list_buckets(
        &self,
        filter: Option<BucketFilter<'_>>,
    ) -> Result<Vec<Bucket>, ControllerError> {
        list_buckets(self.registry.as_ref(), filter).await
    }

    pub async fn load_bucket(&self, hash: &str) -> Result<Bucket, ControllerError> {
        Ok(self.registry.load(hash).await?)
    }

    /// Persist a bucket signed elsewhere. The registry still verifies it.
    pub async fn save_signed_bucket(&self, bucket: &Bucket) -> Result<(), ControllerError> {
        self.registry.save(bucket).await?;
        Ok(())
    }

    pub async fn get_bucket_content(&self, hash: &str) -> Result<Vec<String>, ControllerError> {
        let bucket = self.registry.load(hash).await?;
        Ok(self.bucket_source.get_names(bucket.node()).await?)
    }
}
