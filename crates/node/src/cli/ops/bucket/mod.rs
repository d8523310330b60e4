//! `cbn bucket ..`: thin commands over a running node's HTTP API.

use clap::{Args, Subcommand};

pub mod content;
pub mod create;
pub mod download;
pub mod ls;
pub mod upload;

use cbn_node::http_server::api::ClientError;

use crate::cli::op::{run, ContextError, Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Bucket {
    #[command(subcommand)]
    pub command: BucketCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BucketCommand {
    /// Create a bucket owned by the node
    Create(create::Create),
    /// List every bucket the node knows
    Ls(ls::Ls),
    /// List the files in a bucket
    Content(content::Content),
    /// Upload a local file into a bucket
    Upload(upload::Upload),
    /// Download a file from a bucket
    Download(download::Download),
}

#[derive(Debug, thiserror::Error)]
pub enum BucketOpError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("API error: {0}")]
    Api(#[from] ClientError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot derive a file name from {0}, pass --name")]
    NoFileName(String),
}

#[async_trait::async_trait]
impl Op for Bucket {
    type Error = anyhow::Error;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error> {
        match &self.command {
            BucketCommand::Create(op) => run(op, ctx).await,
            BucketCommand::Ls(op) => run(op, ctx).await,
            BucketCommand::Content(op) => run(op, ctx).await,
            BucketCommand::Upload(op) => run(op, ctx).await,
            BucketCommand::Download(op) => run(op, ctx).await,
        }
    }
}
