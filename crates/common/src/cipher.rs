//! Hashing, randomness and the signing protocol shared by every signed record.

use sha2::{Digest, Sha256};

use crate::crypto::{PublicKey, SecretKey, Signature};

/// Size of a SHA-256 digest in bytes
pub const HASH_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("signature not verified")]
    NotVerified,
    #[error("failed to sign: {0}")]
    Sign(String),
    #[error("could not produce data to sign: {0}")]
    GetDataToSign(String),
}

/// A record that can be signed: it knows its canonical bytes and carries
/// the signature over them.
pub trait Signable {
    /// Canonical bytes covered by the signature.
    fn data(&self) -> Result<Vec<u8>, CipherError>;
    /// Signature currently attached to the record, empty when unsigned.
    fn signature(&self) -> &[u8];
}

/// SHA-256 of `data`.
pub fn hash(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `n` bytes from the OS random source.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    getrandom::getrandom(&mut buf).expect("failed to generate random bytes");
    buf
}

/// Sign the canonical bytes of `item`.
pub fn sign<S: Signable + ?Sized>(item: &S, key: &SecretKey) -> Result<Vec<u8>, CipherError> {
    let data = item.data()?;
    let sig = key
        .try_sign(&data)
        .map_err(|e| CipherError::Sign(e.to_string()))?;
    Ok(sig.to_bytes().to_vec())
}

/// Verify the attached signature of `item` against `key`.
///
/// A malformed or missing signature is reported the same way as a wrong one.
pub fn verify<S: Signable + ?Sized>(item: &S, key: &PublicKey) -> Result<(), CipherError> {
    let data = item.data()?;
    let sig = Signature::from_slice(item.signature()).map_err(|_| CipherError::NotVerified)?;
    key.verify(&data, &sig).map_err(|_| CipherError::NotVerified)
}
