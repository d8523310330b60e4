//! Identity keys for peers and bucket owners.
//!
//! Every peer holds an Ed25519 keypair. The same keypair names the peer on
//! the iroh network (its node id) and owns the buckets it creates: a bucket
//! hash is derived from the owner's public key and every stored bucket
//! carries a signature that only the matching secret key can produce.

mod keys;

pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
