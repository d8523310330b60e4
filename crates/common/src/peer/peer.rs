use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use iroh::discovery::pkarr::dht::DhtDiscovery;
use iroh::{Endpoint, NodeId};

use super::blobs_store::{BlobsStore, BlobsStoreError};
use super::fetch::BlobFetcher;
use crate::crypto::{PublicKey, SecretKey};

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("blobs store error: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error("failed to set up discovery: {0}")]
    Discovery(String),
    #[error("only ipv4 listen addresses are supported, got {0}")]
    Address(SocketAddr),
    #[error("failed to bind endpoint: {0}")]
    Bind(String),
}

#[derive(Clone, Default)]
pub struct PeerBuilder {
    /// the socket addr to expose the peer on
    ///  if not set, an ephemeral port will be used
    socket_address: Option<SocketAddr>,
    /// the identity of the peer, as a SecretKey
    secret_key: Option<SecretKey>,
    /// pre-loaded blobs store, in-memory if not set
    blobs_store: Option<BlobsStore>,
}

impl PeerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn socket_address(mut self, socket_addr: SocketAddr) -> Self {
        self.socket_address = Some(socket_addr);
        self
    }

    pub fn secret_key(mut self, secret_key: SecretKey) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    pub fn blobs_store(mut self, blobs: BlobsStore) -> Self {
        self.blobs_store = Some(blobs);
        self
    }

    pub async fn build(self) -> Result<Peer, PeerError> {
        let socket_addr = self
            .socket_address
            .unwrap_or_else(|| SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0));
        let secret_key = self.secret_key.unwrap_or_else(SecretKey::generate);

        let blobs_store = match self.blobs_store {
            Some(blobs) => blobs,
            None => BlobsStore::memory().await?,
        };

        let mainline_discovery = DhtDiscovery::builder()
            .secret_key(secret_key.0.clone())
            .build()
            .map_err(|e| PeerError::Discovery(e.to_string()))?;

        let addr = match socket_addr {
            SocketAddr::V4(addr) => addr,
            SocketAddr::V6(_) => return Err(PeerError::Address(socket_addr)),
        };

        let endpoint = Endpoint::builder()
            .secret_key(secret_key.0.clone())
            .discovery(mainline_discovery)
            .bind_addr_v4(SocketAddrV4::new(*addr.ip(), addr.port()))
            .bind()
            .await
            .map_err(|e| PeerError::Bind(e.to_string()))?;

        tracing::info!(node_id = %endpoint.node_id(), %socket_addr, "peer endpoint bound");

        Ok(Peer {
            socket_address: socket_addr,
            blobs_store,
            secret_key,
            endpoint,
        })
    }
}

/// A running iroh endpoint together with the identity and blobs store
///  it serves.
#[derive(Debug, Clone)]
pub struct Peer {
    socket_address: SocketAddr,
    blobs_store: BlobsStore,
    secret_key: SecretKey,
    endpoint: Endpoint,
}

impl Peer {
    pub fn blobs(&self) -> &BlobsStore {
        &self.blobs_store
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn socket(&self) -> &SocketAddr {
        &self.socket_address
    }

    pub fn id(&self) -> NodeId {
        self.endpoint.node_id()
    }

    /// A fetcher that pulls missing blobs from `providers` over this endpoint.
    pub fn fetcher(&self, providers: Vec<PublicKey>) -> BlobFetcher {
        BlobFetcher::new(self.endpoint.clone(), providers)
    }
}
