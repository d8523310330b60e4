use std::sync::Arc;

use common::controller::Controller;
use common::p2p::{new_p2p_controller, BlockStore, MemoryReplicatedMap, P2PDomainRegistry};
use common::peer::{BlobsStore, BlobsStoreError, Peer, PeerBuilder, PeerError};
use common::source::{DomainRegistry, ReplicatedMap};

use crate::database::{Database, DatabaseSetupError};
use crate::ServiceConfig;

/// Everything request handlers and background tasks share.
#[derive(Clone, Debug)]
pub struct State {
    peer: Option<Peer>,
    controller: Controller,
    domains: Arc<dyn DomainRegistry>,
}

impl State {
    /// State without a running peer, serving only what is stored locally.
    pub fn new(controller: Controller, domains: Arc<dyn DomainRegistry>) -> Self {
        Self {
            peer: None,
            controller,
            domains,
        }
    }

    pub async fn from_config(config: &ServiceConfig) -> Result<Self, StateSetupError> {
        let blobs = match &config.blobs_path {
            Some(path) => BlobsStore::fs(path).await?,
            None => BlobsStore::memory().await?,
        };

        let mut builder = PeerBuilder::new().blobs_store(blobs.clone());
        if let Some(addr) = config.node_listen_addr {
            builder = builder.socket_address(addr);
        }
        if let Some(secret) = &config.node_secret {
            builder = builder.secret_key(secret.clone());
        }
        let peer = builder.build().await?;

        let fetcher = peer.fetcher(config.peers.clone());
        let store = BlockStore::new(blobs, Some(fetcher));
        let map: Arc<dyn ReplicatedMap> = match &config.map_path {
            Some(path) => Arc::new(Database::open(path).await?),
            None => Arc::new(MemoryReplicatedMap::new()),
        };
        let controller = new_p2p_controller(peer.secret().clone(), map.clone(), store, config.p2p);
        let domains = Arc::new(P2PDomainRegistry::new(map));

        tracing::info!(
            node_id = %peer.id(),
            providers = config.peers.len(),
            write_policy = ?config.p2p.write_policy,
            "service state ready"
        );

        Ok(Self {
            peer: Some(peer),
            controller,
            domains,
        })
    }

    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn domains(&self) -> &Arc<dyn DomainRegistry> {
        &self.domains
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("blobs store error: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error("peer error: {0}")]
    Peer(#[from] PeerError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseSetupError),
}
