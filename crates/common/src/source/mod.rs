//! Capabilities the controller is built on.
//!
//! A registry maps bucket hashes to signed buckets, a bucket source manages
//! the directory nodes a bucket points at, and a data source stores file
//! content. Each backend reports an id (e.g. `"p2p"`) that is recorded in
//! the [`DataRef`]s it produces.

use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::io::AsyncRead;

mod map;

pub use map::{MapError, ReplicatedMap};

use crate::bucket::{Bucket, BucketError, DataRef, DomainRecord};
use crate::linked_data::ContentId;
use crate::peer::BlobsStoreError;

/// Stream of file content handed to a [`DataSource`].
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// Reader over stored file content.
pub type DataReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("replicated map error: {0}")]
    Map(#[from] MapError),
    #[error("blobs store error: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Codec(e.to_string())
    }
}

/// Result of storing a stream of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredData {
    pub cid: ContentId,
    pub size: u64,
}

/// Durable map from bucket hash to signed bucket.
#[async_trait]
pub trait BucketRegistry: Send + Sync + Debug + 'static {
    fn id(&self) -> &str;

    async fn has(&self, hash: &str) -> Result<bool, SourceError>;

    /// Persist a signed bucket. Implementations verify before writing.
    async fn save(&self, bucket: &Bucket) -> Result<(), SourceError>;

    /// Load and authenticate a bucket, [`SourceError::NotFound`] when absent.
    async fn load(&self, hash: &str) -> Result<Bucket, SourceError>;

    /// Visit every stored bucket until the visitor returns `false`.
    async fn for_each(
        &self,
        visitor: &mut (dyn FnMut(&str, Bucket) -> bool + Send),
    ) -> Result<(), SourceError>;
}

/// Directory nodes addressed by content id.
///
/// Nodes are immutable: every mutation returns the id of a new node.
#[async_trait]
pub trait BucketSource: Send + Sync + Debug + 'static {
    fn id(&self) -> &str;

    /// Store an empty directory and return its id.
    async fn new_bucket(&self) -> Result<ContentId, SourceError>;

    /// Link `data_ref` under `name`, replacing any existing link with that name.
    async fn add_child(
        &self,
        root: &ContentId,
        name: &str,
        data_ref: &DataRef,
    ) -> Result<ContentId, SourceError>;

    async fn remove_child(&self, root: &ContentId, name: &str) -> Result<ContentId, SourceError>;

    async fn get_child(&self, root: &ContentId, name: &str) -> Result<DataRef, SourceError>;

    async fn get_names(&self, root: &ContentId) -> Result<Vec<String>, SourceError>;
}

/// Content-addressed file content.
#[async_trait]
pub trait DataSource: Send + Sync + Debug + 'static {
    fn id(&self) -> &str;

    /// Store a stream without buffering it whole.
    async fn add(&self, stream: ByteStream) -> Result<StoredData, SourceError>;

    async fn get(&self, cid: &ContentId) -> Result<DataReader, SourceError>;
}

/// Registry of domain names. A domain can only be registered once.
#[async_trait]
pub trait DomainRegistry: Send + Sync + Debug + 'static {
    async fn register(&self, record: &DomainRecord) -> Result<(), SourceError>;

    async fn resolve(&self, domain: &str) -> Result<DomainRecord, SourceError>;
}
