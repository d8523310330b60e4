/**
 * Buckets, domain records and the errors
 *  they raise while being built, signed
 *  and parsed.
 */
pub mod bucket;
/**
 * Hashing and signing over anything
 *  that can describe its signed bytes.
 */
pub mod cipher;
/**
 * The bucket controller: every operation
 *  a node exposes, over pluggable registry
 *  and sources.
 */
pub mod controller;
/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 */
pub mod crypto;
/**
 * Content addressed identifiers shared
 *  by the directory nodes and the
 *  blobs store.
 */
pub mod linked_data;
/**
 * The "p2p" backend for the registry
 *  and sources.
 */
pub mod p2p;
/**
 * Networking: the iroh endpoint, the
 *  blobs store and the bucket protocols
 *  peers speak to each other.
 */
pub mod peer;
pub mod pointer;
/**
 * Traits the controller is written against.
 */
pub mod source;

pub mod prelude {
    pub use crate::bucket::{Bucket, BucketError, BucketMessage, DataRef, FileHeader};
    pub use crate::controller::{Controller, ControllerError, Visit};
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::linked_data::ContentId;
    pub use crate::p2p::{new_p2p_controller, BlockStore, MemoryReplicatedMap, P2PConfig};
    pub use crate::peer::{BlobsStore, Peer};
    pub use crate::source::{ByteStream, DataReader, SourceError};
}
