use clap::Subcommand;

pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Bucket, Init, Node};

use op::{run, OpContext};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the config directory with a fresh node key
    Init(Init),
    /// Run the node until interrupted
    Node(Node),
    /// Manage the buckets of a running node
    Bucket(Bucket),
}

impl Command {
    pub async fn execute(&self, ctx: &OpContext) -> anyhow::Result<String> {
        match self {
            Command::Init(op) => run(op, ctx).await,
            Command::Node(op) => run(op, ctx).await,
            Command::Bucket(op) => run(op, ctx).await,
        }
    }
}
