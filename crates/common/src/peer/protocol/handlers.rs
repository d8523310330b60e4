use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::framing::{read_frame, write_frame};
use super::{ProtocolError, ProtocolKind};
use crate::bucket::BucketMessage;
use crate::controller::Controller;
use crate::pointer::Pointer;

/// Response body of the get-bucket-content protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketContent {
    pub items: Vec<String>,
}

async fn read_pointer<R>(recv: &mut R) -> Result<Pointer, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let raw = read_frame(recv).await?;
    let text = String::from_utf8(raw).map_err(|_| ProtocolError::NotUtf8)?;
    Ok(text.parse()?)
}

pub async fn handle_list<W>(controller: &Controller, send: &mut W) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let buckets = controller.list_buckets(None).await?;
    let messages: Vec<BucketMessage> = buckets.iter().map(BucketMessage::from).collect();
    tracing::debug!(count = messages.len(), "serving bucket list");
    write_frame(send, &serde_json::to_vec(&messages)?).await
}

pub async fn handle_save<R, W>(
    controller: &Controller,
    recv: &mut R,
    send: &mut W,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let raw = read_frame(recv).await?;
    let message: BucketMessage = serde_json::from_slice(&raw)?;
    let bucket = message.into_verified()?;
    controller.save_signed_bucket(&bucket).await?;

    let hash = bucket.hash();
    tracing::debug!(%hash, "saved bucket from peer");
    write_frame(send, hash.as_bytes()).await
}

pub async fn handle_get_content<R, W>(
    controller: &Controller,
    recv: &mut R,
    send: &mut W,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let pointer = read_pointer(recv).await?;
    let items = controller.get_bucket_content(&pointer.bucket).await?;
    let content = BucketContent { items };
    write_frame(send, &serde_json::to_vec(&content)?).await
}

/// Streams the file unframed. The end of the stream marks the end of the file.
pub async fn handle_download<R, W>(
    controller: &Controller,
    recv: &mut R,
    send: &mut W,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let pointer = read_pointer(recv).await?;
    let (mut reader, data_ref) = controller.download(&pointer.bucket, &pointer.name).await?;
    let copied = tokio::io::copy(&mut reader, send).await?;
    tracing::debug!(
        bucket = %pointer.bucket,
        name = %pointer.name,
        cid = %data_ref.cid,
        copied,
        "served download"
    );
    Ok(())
}

/// Run one request of `kind` to completion and close the send side.
pub async fn serve<R, W>(
    kind: ProtocolKind,
    controller: &Controller,
    recv: &mut R,
    send: &mut W,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match kind {
        ProtocolKind::List => handle_list(controller, send).await?,
        ProtocolKind::Save => handle_save(controller, recv, send).await?,
        ProtocolKind::GetContent => handle_get_content(controller, recv, send).await?,
        ProtocolKind::Download => handle_download(controller, recv, send).await?,
    }
    send.shutdown().await?;
    Ok(())
}
