use clap::Args;

use super::BucketOpError;
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Name of the new bucket
    pub name: String,
}

#[async_trait::async_trait]
impl Op for Create {
    type Error = BucketOpError;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error> {
        let bucket = ctx.client()?.create_bucket(&self.name).await?;
        Ok(format!("Created bucket '{}' with hash {}", bucket.name, bucket.hash))
    }
}
