use std::path::PathBuf;

use url::Url;

use cbn_node::http_server::api::{ApiClient, ClientError};
use cbn_node::state::{AppState, StateError};

/// What every command runs against.
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.cbn)
    pub config_path: Option<PathBuf>,
    /// API of a running node, localhost at the configured port if unset
    pub api_url: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("cannot find the node's api port: {0}")]
    State(#[from] StateError),
    #[error("bad api url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, api_url: Option<Url>) -> Self {
        Self {
            config_path,
            api_url,
        }
    }

    pub fn client(&self) -> Result<ApiClient, ContextError> {
        let url = match &self.api_url {
            Some(url) => url.clone(),
            None => {
                let state = AppState::load(self.config_path.clone())?;
                Url::parse(&format!("http://127.0.0.1:{}/", state.config.api_port))?
            }
        };
        Ok(ApiClient::new(&url)?)
    }
}

/// One CLI command. On success its output is printed as is.
#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Into<anyhow::Error> + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error>;
}

/// Execute `op`, erasing its error type.
pub async fn run<O: Op>(op: &O, ctx: &OpContext) -> anyhow::Result<String> {
    op.execute(ctx).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_prefers_api_url() {
        let url = Url::parse("http://node.local:7000/").unwrap();
        let ctx = OpContext::new(None, Some(url.clone()));
        assert_eq!(ctx.client().unwrap().base_url(), &url);
    }

    #[test]
    fn test_client_needs_an_initialized_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = OpContext::new(Some(dir.path().join("missing")), None);
        assert!(matches!(
            ctx.client(),
            Err(ContextError::State(StateError::NotInitialized))
        ));
    }
}
