use clap::Args;

use cbn_node::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// HTTP API port (default: 5001)
    #[arg(long, default_value_t = 5001)]
    pub api_port: u16,

    /// Peer (P2P) node listen port (optional, defaults to ephemeral port if not specified)
    #[arg(long)]
    pub peer_port: Option<u16>,

    /// Hex node id of a peer to pull buckets and blobs from (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] cbn_node::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<String, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            peer_port: self.peer_port,
            peers: self.peers.clone(),
            ..Default::default()
        };
        // reject malformed peer ids before anything is written
        config.peer_keys()?;

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let node_id = state.load_key()?.public().to_hex();

        let peer_port_str = match state.config.peer_port {
            Some(port) => format!("{}", port),
            None => "ephemeral (auto-assigned)".to_string(),
        };

        let output = format!(
            "Initialized cbn directory at: {}\n\
             - Key: {}\n\
             - Blobs: {}\n\
             - Config: {}\n\
             - Node id: {}\n\
             - API port: {}\n\
             - Peer port: {}",
            state.cbn_dir.display(),
            state.key_path.display(),
            state.blobs_path.display(),
            state.config_path.display(),
            node_id,
            state.config.api_port,
            peer_port_str
        );

        Ok(output)
    }
}
