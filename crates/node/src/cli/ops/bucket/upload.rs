use std::path::PathBuf;

use clap::Args;

use super::BucketOpError;
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Bucket hash or name
    pub bucket: String,

    /// Local file to upload
    pub path: PathBuf,

    /// Name inside the bucket (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Content type recorded with the file
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,
}

#[async_trait::async_trait]
impl Op for Upload {
    type Error = BucketOpError;

    async fn execute(&self, ctx: &OpContext) -> Result<String, Self::Error> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| BucketOpError::NoFileName(self.path.display().to_string()))?,
        };

        let client = ctx.client()?;
        let hash = client.resolve_bucket(&self.bucket).await?;
        let file = tokio::fs::File::open(&self.path).await?;
        let data_ref = client
            .upload(&hash, &name, &self.content_type, file)
            .await?;

        Ok(format!(
            "Uploaded {} ({} bytes) as {}",
            data_ref.header.filename, data_ref.header.size, data_ref.cid
        ))
    }
}
