use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use common::p2p::P2PConfig;
use common::prelude::{PublicKey, SecretKey};

#[derive(Debug, Clone)]
pub struct Config {
    // peer configuration
    /// address for our peer to listen on,
    ///  if not set then an ephemeral port will be used
    pub node_listen_addr: Option<SocketAddr>,
    /// the node identity, also the default bucket owner,
    ///  if not set then a new secret will be generated
    pub node_secret: Option<SecretKey>,
    /// peers to pull buckets and missing blobs from
    pub peers: Vec<PublicKey>,
    /// how often to pull buckets from `peers`, never if not set
    pub sync_interval: Option<Duration>,

    // storage configuration
    /// path to the iroh-blobs fs store,
    ///  if not set then an in-memory store will be used
    pub blobs_path: Option<PathBuf>,
    /// sqlite file backing the bucket and domain map,
    ///  if not set then everything is forgotten on exit
    pub map_path: Option<PathBuf>,
    pub p2p: P2PConfig,

    // http server configuration
    pub api_port: u16,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_listen_addr: None,
            node_secret: None,
            peers: Vec::new(),
            sync_interval: None,
            blobs_path: None,
            map_path: None,
            p2p: P2PConfig::default(),
            api_port: 5001,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
