use std::str::FromStr;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{base64::Base64, serde_as, DeserializeAs, SerializeAs};
use time::OffsetDateTime;

use crate::cipher::{self, CipherError, Signable};
use crate::crypto::{KeyError, PublicKey, SecretKey};
use crate::linked_data::ContentId;

/// Length of the random salt fixed at bucket creation
pub const SALT_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("pub key conflict")]
    PkConflict,
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Global identifier of a bucket: `hex(sha256(name ++ pubkey))`.
pub fn bucket_hash(name: &str, pubkey: &[u8]) -> String {
    let mut data = Vec::with_capacity(name.len() + pubkey.len());
    data.extend_from_slice(name.as_bytes());
    data.extend_from_slice(pubkey);
    hex::encode(cipher::hash(&data))
}

/// A named, owned collection of files.
///
/// `node` points at the root directory node holding the current listing.
/// Only the holder of the secret key matching `pubkey` can produce a
/// signature that verifies, so only they can publish a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    name: String,
    node: ContentId,
    updated: i64,
    salt: Vec<u8>,
    pubkey: Vec<u8>,
    sig: Vec<u8>,
}

impl Bucket {
    /// Unsigned bucket owned by `owner`, pointing at `root`.
    pub fn new(name: &str, owner: &PublicKey, root: ContentId) -> Result<Self, BucketError> {
        if name.is_empty() {
            return Err(BucketError::BadInput("bucket name cannot be empty".into()));
        }
        Ok(Self {
            name: name.to_string(),
            node: root,
            updated: 0,
            salt: cipher::random_bytes(SALT_SIZE),
            pubkey: owner.to_bytes().to_vec(),
            sig: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &ContentId {
        &self.node
    }

    pub fn updated(&self) -> i64 {
        self.updated
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Raw bytes of the owner's public key.
    pub fn pk(&self) -> &[u8] {
        &self.pubkey
    }

    pub fn owner(&self) -> Result<PublicKey, BucketError> {
        Ok(PublicKey::try_from(self.pubkey.as_slice())?)
    }

    pub fn is_signed(&self) -> bool {
        !self.sig.is_empty()
    }

    pub fn hash(&self) -> String {
        bucket_hash(&self.name, &self.pubkey)
    }

    /// Re-point the bucket at a new root, but only if it still points at
    /// `from`. The signature is left stale until the next [`Bucket::sign`].
    pub fn swap_node(&mut self, from: &ContentId, to: ContentId) -> bool {
        if &self.node != from {
            return false;
        }
        self.node = to;
        true
    }

    /// Stamp and sign with `key`.
    ///
    /// Works on a copy that must verify against the embedded owner before
    /// `updated` and `sig` are replaced together. On any failure the bucket
    /// is left untouched, so a key that does not own the bucket cannot sign it.
    pub fn sign(&mut self, key: &SecretKey) -> Result<(), BucketError> {
        let mut copy = self.clone();
        copy.updated = OffsetDateTime::now_utc().unix_timestamp();
        copy.sig = cipher::sign(&copy, key)?;
        copy.verify()?;

        self.updated = copy.updated;
        self.sig = copy.sig;
        Ok(())
    }

    pub fn verify(&self) -> Result<(), BucketError> {
        let owner = self.owner()?;
        cipher::verify(self, &owner)?;
        Ok(())
    }

    /// Fail with [`BucketError::PkConflict`] unless `expected` is this
    /// bucket's recomputed hash.
    pub fn verify_hash(&self, expected: &str) -> Result<(), BucketError> {
        if self.hash() != expected.trim_matches('/') {
            return Err(BucketError::PkConflict);
        }
        Ok(())
    }
}

impl Signable for Bucket {
    fn data(&self) -> Result<Vec<u8>, CipherError> {
        let node = self.node.to_string();
        let updated = self.updated.to_string();
        let mut data = Vec::with_capacity(
            self.name.len() + node.len() + updated.len() + self.salt.len() + self.pubkey.len(),
        );
        data.extend_from_slice(self.name.as_bytes());
        data.extend_from_slice(node.as_bytes());
        data.extend_from_slice(updated.as_bytes());
        data.extend_from_slice(&self.salt);
        data.extend_from_slice(&self.pubkey);
        Ok(data)
    }

    fn signature(&self) -> &[u8] {
        &self.sig
    }
}

/// `Node` travels as base64 of the content id's text form.
struct NodeText;

impl SerializeAs<ContentId> for NodeText {
    fn serialize_as<S: Serializer>(node: &ContentId, serializer: S) -> Result<S::Ok, S::Error> {
        <Base64 as SerializeAs<Vec<u8>>>::serialize_as(&node.to_string().into_bytes(), serializer)
    }
}

impl<'de> DeserializeAs<'de, ContentId> for NodeText {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<ContentId, D::Error> {
        let raw: Vec<u8> = <Base64 as DeserializeAs<'de, Vec<u8>>>::deserialize_as(deserializer)?;
        let text = String::from_utf8(raw).map_err(D::Error::custom)?;
        ContentId::from_str(&text).map_err(D::Error::custom)
    }
}

/// Wire and storage form of a bucket.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketMessage {
    pub hash: String,
    pub name: String,
    #[serde_as(as = "NodeText")]
    pub node: ContentId,
    pub updated: i64,
    #[serde_as(as = "Base64")]
    pub salt: Vec<u8>,
    #[serde(rename = "PK")]
    #[serde_as(as = "Base64")]
    pub pk: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub sig: Vec<u8>,
}

impl From<&Bucket> for BucketMessage {
    fn from(bucket: &Bucket) -> Self {
        Self {
            hash: bucket.hash(),
            name: bucket.name.clone(),
            node: bucket.node,
            updated: bucket.updated,
            salt: bucket.salt.clone(),
            pk: bucket.pubkey.clone(),
            sig: bucket.sig.clone(),
        }
    }
}

impl From<BucketMessage> for Bucket {
    fn from(msg: BucketMessage) -> Self {
        Self {
            name: msg.name,
            node: msg.node,
            updated: msg.updated,
            salt: msg.salt,
            pubkey: msg.pk,
            sig: msg.sig,
        }
    }
}

impl BucketMessage {
    /// Convert into a bucket, checking the signature and the hash the
    /// message claims.
    pub fn into_verified(self) -> Result<Bucket, BucketError> {
        let hash = self.hash.clone();
        let bucket = Bucket::from(self);
        bucket.verify()?;
        bucket.verify_hash(&hash)?;
        Ok(bucket)
    }
}

/// Decode and authenticate a stored or received bucket.
///
/// When `expected_hash` is non-empty the recomputed hash must match it.
pub fn parse_bucket(expected_hash: &str, raw: &[u8]) -> Result<Bucket, BucketError> {
    let msg: BucketMessage = serde_json::from_slice(raw)?;
    let bucket = Bucket::from(msg);
    bucket.verify()?;
    if !expected_hash.is_empty() {
        bucket.verify_hash(expected_hash)?;
    }
    Ok(bucket)
}

/// Encode a bucket for storage. Unsigned or tampered buckets are refused.
pub fn serialize_bucket(bucket: &Bucket) -> Result<Vec<u8>, BucketError> {
    bucket.verify()?;
    Ok(serde_json::to_vec(&BucketMessage::from(bucket))?)
}
