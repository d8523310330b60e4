//! The "p2p" backend: buckets in a replicated map, directory nodes and file
//! content in the iroh blobs store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod bucket_registry;
mod bucket_source;
mod data_source;
mod domain_registry;
mod memory_map;
mod store;

pub use bucket_registry::{bucket_key, P2PBucketRegistry, WritePolicy, DEFAULT_CACHE_CAPACITY};
pub use bucket_source::{Directory, P2PBucketSource};
pub use data_source::P2PDataSource;
pub use domain_registry::{domain_key, P2PDomainRegistry, DOMAIN_PREFIX};
pub use memory_map::MemoryReplicatedMap;
pub use store::BlockStore;

use crate::controller::Controller;
use crate::crypto::SecretKey;
use crate::source::ReplicatedMap;

/// Source id recorded in every `DataRef` this backend produces
pub const P2P_SOURCE: &str = "p2p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PConfig {
    /// Capacity of the registry's bucket cache
    pub cache_capacity: u64,
    pub write_policy: WritePolicy,
}

impl Default for P2PConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            write_policy: WritePolicy::default(),
        }
    }
}

/// Wire a controller to the p2p registry and sources.
pub fn new_p2p_controller(
    identity: SecretKey,
    map: Arc<dyn ReplicatedMap>,
    store: BlockStore,
    config: P2PConfig,
) -> Controller {
    let registry = P2PBucketRegistry::new(map, config.cache_capacity, config.write_policy);
    let bucket_source = P2PBucketSource::new(store.clone());
    let data_source = P2PDataSource::new(store);
    Controller::new(
        identity,
        Arc::new(registry),
        Arc::new(bucket_source),
        Arc::new(data_source),
    )
}
