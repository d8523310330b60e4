use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncWriteExt;

use cbn_node::http_server::api::ClientError;

use super::BucketOpError;
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Download {
    /// Bucket hash or name
    pub bucket: String,

    /// File name inside the bucket
    pub name: String,

    /// Where to write the file (defaults to the file name in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Op for Download {
    type Error = BucketOpError;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error> {
        let client = ctx.client()?;
        let hash = client.resolve_bucket(&self.bucket).await?;
        let mut response = client.download(&hash, &self.name).await?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name));
        let mut file = tokio::fs::File::create(&output).await?;
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(ClientError::from)? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        Ok(format!("Saved {} bytes to {}", written, output.display()))
    }
}
