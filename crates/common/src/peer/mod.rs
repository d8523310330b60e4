use iroh::protocol::Router;
use tokio::sync::watch::Receiver as WatchReceiver;

mod blobs_store;
mod fetch;
#[allow(clippy::module_inception)]
mod peer;
pub mod protocol;

pub use blobs_store::{BlobsStore, BlobsStoreError};
pub use fetch::BlobFetcher;
pub use peer::{Peer, PeerBuilder, PeerError};
pub use protocol::{BucketProtocol, ProtocolKind};

// Re-export iroh types for convenience
pub use iroh::NodeAddr;

use crate::controller::Controller;

/// Serve the blobs protocol and every bucket protocol on the peer's
/// endpoint until `shutdown_rx` fires.
pub async fn spawn(
    peer: Peer,
    controller: Controller,
    mut shutdown_rx: WatchReceiver<()>,
) -> anyhow::Result<()> {
    let blobs = peer.blobs().protocol();
    let mut router_builder =
        Router::builder(peer.endpoint().clone()).accept(iroh_blobs::ALPN, blobs);
    for kind in ProtocolKind::ALL {
        router_builder =
            router_builder.accept(kind.alpn(), BucketProtocol::new(controller.clone(), kind));
    }

    let router = router_builder.spawn();
    tracing::info!(node_id = %peer.id(), "peer router started");

    let _ = shutdown_rx.changed().await;

    router.shutdown().await?;
    Ok(())
}
