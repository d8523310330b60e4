use std::fmt;
use std::ops::Deref;

use ed25519_dalek::Signer;
use iroh::{PublicKey as NodeKey, SecretKey as NodeSecret};
use serde::{Deserialize, Serialize};

pub const PRIVATE_KEY_SIZE: usize = 32;
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Size of a detached Ed25519 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

const PEM_TAG: &str = "PRIVATE KEY";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("expected {expected} key bytes, got {got}")]
    Length { expected: usize, got: usize },
    #[error("bad hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("not an ed25519 point: {0}")]
    NotOnCurve(String),
    #[error("bad pem: {0}")]
    Pem(#[from] pem::PemError),
    #[error("unexpected pem tag {0:?}")]
    PemTag(String),
}

fn fixed<const N: usize>(raw: &[u8]) -> Result<[u8; N], KeyError> {
    raw.try_into().map_err(|_| KeyError::Length {
        expected: N,
        got: raw.len(),
    })
}

fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N], KeyError> {
    let raw = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
    fixed(&raw)
}

/// Owner of buckets and identity of a peer.
///
/// The same 32 bytes are the iroh node id, the `PK` field carried by every
/// bucket and the input, with the bucket name, of the bucket hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey(NodeKey);

impl Deref for PublicKey {
    type Target = NodeKey;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<NodeKey> for PublicKey {
    fn from(key: NodeKey) -> Self {
        Self(key)
    }
}

impl From<PublicKey> for NodeKey {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = fixed(raw)?;
        NodeKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|e| KeyError::NotOnCurve(e.to_string()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl PublicKey {
    /// Plain or `0x` prefixed hex.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = decode_hex(s)?;
        Self::try_from(&bytes[..])
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Strict Ed25519 verification of `sig` over `msg`.
    pub fn verify(
        &self,
        msg: &[u8],
        sig: &ed25519_dalek::Signature,
    ) -> Result<(), ed25519_dalek::SignatureError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.to_bytes())?.verify_strict(msg, sig)
    }
}

/// Signing half of a [`PublicKey`]. Stored as PEM in `~/.cbn/key.pem`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretKey(pub NodeSecret);

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(seed: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(NodeSecret::from_bytes(&seed))
    }
}

impl Deref for SecretKey {
    type Target = NodeSecret;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl SecretKey {
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        decode_hex::<PRIVATE_KEY_SIZE>(s).map(Self::from)
    }

    pub fn generate() -> Self {
        let mut seed = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut seed).expect("os rng unavailable");
        Self::from(seed)
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.public())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PEM_TAG, self.to_bytes()))
    }

    pub fn from_pem(s: &str) -> Result<Self, KeyError> {
        let block = pem::parse(s)?;
        if block.tag() != PEM_TAG {
            return Err(KeyError::PemTag(block.tag().to_string()));
        }
        fixed::<PRIVATE_KEY_SIZE>(block.contents()).map(Self::from)
    }

    /// Detached signature over `msg`.
    pub fn try_sign(
        &self,
        msg: &[u8],
    ) -> Result<ed25519_dalek::Signature, ed25519_dalek::SignatureError> {
        // iroh pins its own ed25519_dalek, so go through the raw seed
        ed25519_dalek::SigningKey::from_bytes(&self.to_bytes()).try_sign(msg)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hex_accepts_prefix() {
        let secret = SecretKey::generate();
        let public = secret.public();

        let again = SecretKey::from_hex(&format!("0x{}", secret.to_hex())).unwrap();
        assert_eq!(again.to_bytes(), secret.to_bytes());
        assert_eq!(PublicKey::from_hex(&public.to_hex()).unwrap(), public);
        assert_eq!(public.to_string(), public.to_hex());
    }

    #[test]
    fn test_hex_length_checked() {
        let err = PublicKey::from_hex("abcd").unwrap_err();
        assert!(matches!(err, KeyError::Length { expected: 32, got: 2 }));
        assert!(matches!(SecretKey::from_hex("zz"), Err(KeyError::Hex(_))));
    }

    #[test]
    fn test_pem() {
        let secret = SecretKey::generate();
        let again = SecretKey::from_pem(&secret.to_pem()).unwrap();
        assert_eq!(again.public(), secret.public());

        let wrong = pem::encode(&pem::Pem::new("PUBLIC KEY", vec![0u8; PRIVATE_KEY_SIZE]));
        assert!(matches!(SecretKey::from_pem(&wrong), Err(KeyError::PemTag(_))));

        let short = pem::encode(&pem::Pem::new(PEM_TAG, vec![0u8; 16]));
        assert!(matches!(SecretKey::from_pem(&short), Err(KeyError::Length { .. })));
    }

    #[test]
    fn test_signatures() {
        let secret = SecretKey::generate();
        let sig = secret.try_sign(b"bucket").unwrap();

        assert!(secret.public().verify(b"bucket", &sig).is_ok());
        assert!(secret.public().verify(b"bucket!", &sig).is_err());
        assert!(SecretKey::generate().public().verify(b"bucket", &sig).is_err());
    }

    #[test]
    fn test_public_key_from_slice() {
        let key = SecretKey::generate().public();
        let bytes = key.to_bytes();
        assert_eq!(PublicKey::try_from(&bytes[..]).unwrap(), key);
        assert!(PublicKey::try_from(&bytes[..31]).is_err());
    }
}
