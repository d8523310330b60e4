use std::fmt;
use std::str::FromStr;

use iroh_blobs::Hash;
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Size of a content id in bytes (a BLAKE3 digest)
pub const CONTENT_ID_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ContentIdError {
    #[error("invalid content id: {0}")]
    Invalid(String),
}

/// Opaque, immutable handle to a blob or directory node in the blobs store.
///
/// The textual form is the lower-case hex of the underlying hash; that text
/// is what buckets sign and what travels on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct ContentId([u8; CONTENT_ID_SIZE]);

impl ContentId {
    pub fn from_bytes(bytes: [u8; CONTENT_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CONTENT_ID_SIZE] {
        &self.0
    }

    pub fn hash(&self) -> Hash {
        Hash::from_bytes(self.0)
    }
}

impl From<Hash> for ContentId {
    fn from(hash: Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl From<ContentId> for Hash {
    fn from(id: ContentId) -> Self {
        id.hash()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut buff = [0u8; CONTENT_ID_SIZE];
        hex::decode_to_slice(s, &mut buff).map_err(|_| ContentIdError::Invalid(s.to_string()))?;
        Ok(Self(buff))
    }
}
