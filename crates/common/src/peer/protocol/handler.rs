use futures::future::BoxFuture;
use iroh::endpoint::Connection;
use iroh::protocol::{AcceptError, ProtocolHandler};

use super::handlers::serve;
use super::ProtocolKind;
use crate::controller::Controller;

/// Accepts connections for one of the bucket protocols and answers them
/// from the controller.
#[derive(Clone, Debug)]
pub struct BucketProtocol {
    controller: Controller,
    kind: ProtocolKind,
}

impl BucketProtocol {
    pub fn new(controller: Controller, kind: ProtocolKind) -> Self {
        Self { controller, kind }
    }

    pub fn kind(&self) -> ProtocolKind {
        self.kind
    }
}

impl ProtocolHandler for BucketProtocol {
    #[allow(refining_impl_trait)]
    fn accept(&self, conn: Connection) -> BoxFuture<'static, Result<(), AcceptError>> {
        let this = self.clone();
        Box::pin(async move {
            let kind = this.kind;
            tracing::debug!(%kind, "new connection from {:?}", conn.remote_node_id());

            let (mut send, mut recv) = conn.accept_bi().await.map_err(|e| {
                tracing::error!(%kind, "failed to accept bidirectional stream: {}", e);
                AcceptError::from(e)
            })?;

            if let Err(e) = serve(kind, &this.controller, &mut recv, &mut send).await {
                tracing::warn!(%kind, "request failed: {}", e);
                return Err(AcceptError::from(std::io::Error::other(e)));
            }

            conn.closed().await;
            Ok(())
        })
    }
}
