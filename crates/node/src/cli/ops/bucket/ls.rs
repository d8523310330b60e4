use clap::Args;

use super::BucketOpError;
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Only show buckets with this name
    #[arg(long)]
    pub name: Option<String>,
}

#[async_trait::async_trait]
impl Op for Ls {
    type Error = BucketOpError;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error> {
        let buckets = ctx.client()?.list_buckets().await?;
        let lines: Vec<String> = buckets
            .iter()
            .filter(|b| self.name.as_deref().map_or(true, |name| b.name == name))
            .map(|b| format!("{}  {}  (updated {})", b.hash, b.name, b.updated))
            .collect();

        if lines.is_empty() {
            Ok("No buckets found".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}
