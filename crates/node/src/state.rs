use std::{fs, path::PathBuf};

use common::p2p::{WritePolicy, DEFAULT_CACHE_CAPACITY};
use common::prelude::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "cbn";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";
pub const MAP_FILE_NAME: &str = "buckets.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP API
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Listen port for the peer (P2P) node (optional, defaults to ephemeral)
    #[serde(default)]
    pub peer_port: Option<u16>,
    /// Hex node ids of peers to pull buckets and blobs from
    #[serde(default)]
    pub peers: Vec<String>,
    /// Number of serialized buckets kept in the registry cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default)]
    pub write_policy: WritePolicy,
    /// Seconds between bucket pulls from `peers`, 0 disables pulling
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (logs to stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_api_port() -> u16 {
    5001
}

fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

fn default_sync_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            peer_port: None,
            peers: Vec::new(),
            cache_capacity: default_cache_capacity(),
            write_policy: WritePolicy::default(),
            sync_interval_secs: default_sync_interval(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn peer_keys(&self) -> Result<Vec<PublicKey>, StateError> {
        self.peers
            .iter()
            .map(|peer| {
                PublicKey::from_hex(peer)
                    .map_err(|e| StateError::InvalidPeer(peer.clone(), e.to_string()))
            })
            .collect()
    }

    pub fn tracing_level(&self) -> Result<tracing::Level, StateError> {
        self.log_level
            .parse()
            .map_err(|_| StateError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the cbn directory (~/.cbn)
    pub cbn_dir: PathBuf,
    /// Path to the node key PEM file
    pub key_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the sqlite file holding bucket and domain records,
    ///  created on first start
    pub map_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// `custom_path`, or `~/.cbn`.
    pub fn cbn_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match custom_path {
            Some(path) => Ok(path),
            None => dirs::home_dir()
                .map(|home| home.join(format!(".{}", APP_NAME)))
                .ok_or(StateError::NoHomeDirectory),
        }
    }

    fn at(cbn_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            key_path: cbn_dir.join(KEY_FILE_NAME),
            blobs_path: cbn_dir.join(BLOBS_DIR_NAME),
            map_path: cbn_dir.join(MAP_FILE_NAME),
            config_path: cbn_dir.join(CONFIG_FILE_NAME),
            cbn_dir,
            config,
        }
    }

    /// Create the directory with a fresh node key, an empty blobs store and
    /// `config` (or the defaults). Refuses to touch an existing directory.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let cbn_dir = Self::cbn_dir(custom_path)?;
        if cbn_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let state = Self::at(cbn_dir, config.unwrap_or_default());
        fs::create_dir_all(&state.blobs_path)?;
        fs::write(&state.key_path, SecretKey::generate().to_pem())?;
        fs::write(&state.config_path, toml::to_string_pretty(&state.config)?)?;
        Ok(state)
    }

    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let cbn_dir = Self::cbn_dir(custom_path)?;
        if !cbn_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let mut state = Self::at(cbn_dir, AppConfig::default());
        for (path, name) in [
            (&state.key_path, KEY_FILE_NAME.to_string()),
            (&state.blobs_path, format!("{}/", BLOBS_DIR_NAME)),
            (&state.config_path, CONFIG_FILE_NAME.to_string()),
        ] {
            if !path.exists() {
                return Err(StateError::MissingFile(name));
            }
        }

        state.config = toml::from_str(&fs::read_to_string(&state.config_path)?)?;
        Ok(state)
    }

    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cbn directory not initialized. Run 'cbn init' first")]
    NotInitialized,

    #[error("cbn directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid peer id {0}: {1}")]
    InvalidPeer(String, String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
