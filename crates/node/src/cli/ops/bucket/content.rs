use clap::Args;

use super::BucketOpError;
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Content {
    /// Bucket hash or name
    pub bucket: String,
}

#[async_trait::async_trait]
impl Op for Content {
    type Error = BucketOpError;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error> {
        let client = ctx.client()?;
        let hash = client.resolve_bucket(&self.bucket).await?;
        let names = client.bucket_content(&hash).await?;

        if names.is_empty() {
            Ok(format!("Bucket {} is empty", hash))
        } else {
            Ok(names.join("\n"))
        }
    }
}
