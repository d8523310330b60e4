use std::net::SocketAddr;
use std::time::Duration;

use clap::Args;

use cbn_node::state::AppState;
use cbn_node::{spawn_service, ServiceConfig};
use common::p2p::P2PConfig;

#[derive(Args, Debug, Clone)]
pub struct Node {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override peer listen port (default from config)
    #[arg(long)]
    pub peer_port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,

    /// Keep blobs and bucket records in memory instead of the config directory
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("state error: {0}")]
    StateError(#[from] cbn_node::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Node {
    type Error = NodeError;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<String, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let secret_key = state.load_key()?;

        let node_listen_addr = self
            .peer_port
            .or(state.config.peer_port)
            .map(|port| SocketAddr::from(([0, 0, 0, 0], port)));

        let sync_interval = match state.config.sync_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let config = ServiceConfig {
            node_listen_addr,
            node_secret: Some(secret_key),
            peers: state.config.peer_keys()?,
            sync_interval,
            blobs_path: (!self.ephemeral).then(|| state.blobs_path.clone()),
            map_path: (!self.ephemeral).then(|| state.map_path.clone()),
            p2p: P2PConfig {
                cache_capacity: state.config.cache_capacity,
                write_policy: state.config.write_policy,
            },
            api_port: self.api_port.unwrap_or(state.config.api_port),
            log_level: state.config.tracing_level()?,
            log_dir: self.log_dir.clone().or(state.config.log_dir.clone()),
        };

        spawn_service(&config).await;
        Ok("node stopped".to_string())
    }
}
