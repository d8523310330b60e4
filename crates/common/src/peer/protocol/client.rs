use iroh::endpoint::{Connection, RecvStream, SendStream};
use iroh::{Endpoint, NodeId};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::framing::{read_frame, write_frame};
use super::handlers::BucketContent;
use super::{ProtocolError, ProtocolKind};
use crate::bucket::{serialize_bucket, Bucket, BucketMessage};
use crate::crypto::PublicKey;
use crate::pointer::Pointer;

/// Ask for every bucket the remote holds. Each returned bucket has been
/// verified against its signature and claimed hash.
pub async fn request_list<R, W>(recv: &mut R, send: &mut W) -> Result<Vec<Bucket>, ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send.shutdown().await?;
    let raw = read_frame(recv).await?;
    let messages: Vec<BucketMessage> = serde_json::from_slice(&raw)?;
    messages
        .into_iter()
        .map(|msg| msg.into_verified().map_err(ProtocolError::from))
        .collect()
}

/// Hand a signed bucket to the remote. Returns the hash it reports back.
pub async fn request_save<R, W>(
    bucket: &Bucket,
    recv: &mut R,
    send: &mut W,
) -> Result<String, ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_frame(send, &serialize_bucket(bucket)?).await?;
    send.shutdown().await?;
    let raw = read_frame(recv).await?;
    String::from_utf8(raw).map_err(|_| ProtocolError::NotUtf8)
}

pub async fn request_bucket_content<R, W>(
    hash: &str,
    recv: &mut R,
    send: &mut W,
) -> Result<Vec<String>, ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let pointer = Pointer::bucket_only(hash);
    write_frame(send, pointer.to_string().as_bytes()).await?;
    send.shutdown().await?;
    let raw = read_frame(recv).await?;
    let content: BucketContent = serde_json::from_slice(&raw)?;
    Ok(content.items)
}

/// Copy file `name` of bucket `hash` into `out`. Returns the number of
/// bytes received.
pub async fn request_download<R, W, O>(
    hash: &str,
    name: &str,
    recv: &mut R,
    send: &mut W,
    out: &mut O,
) -> Result<u64, ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
{
    let pointer = Pointer::new(hash, name);
    write_frame(send, pointer.to_string().as_bytes()).await?;
    send.shutdown().await?;
    let copied = tokio::io::copy(recv, out).await?;
    out.flush().await?;
    Ok(copied)
}

async fn open(
    endpoint: &Endpoint,
    peer: &PublicKey,
    kind: ProtocolKind,
) -> Result<(Connection, SendStream, RecvStream), ProtocolError> {
    let node_id = NodeId::from(*peer);
    let conn = endpoint
        .connect(node_id, kind.alpn())
        .await
        .map_err(|e| {
            tracing::warn!(%kind, %node_id, "failed to connect to peer: {}", e);
            ProtocolError::Connect(e.to_string())
        })?;
    let (send, recv) = conn
        .open_bi()
        .await
        .map_err(|e| ProtocolError::Connect(e.to_string()))?;
    Ok((conn, send, recv))
}

fn close(conn: Connection) {
    conn.close(0u32.into(), b"done");
}

pub async fn list_buckets(
    endpoint: &Endpoint,
    peer: &PublicKey,
) -> Result<Vec<Bucket>, ProtocolError> {
    let (conn, mut send, mut recv) = open(endpoint, peer, ProtocolKind::List).await?;
    let result = request_list(&mut recv, &mut send).await;
    close(conn);
    result
}

pub async fn save_bucket(
    endpoint: &Endpoint,
    peer: &PublicKey,
    bucket: &Bucket,
) -> Result<String, ProtocolError> {
    let (conn, mut send, mut recv) = open(endpoint, peer, ProtocolKind::Save).await?;
    let result = request_save(bucket, &mut recv, &mut send).await;
    close(conn);
    result
}

pub async fn get_bucket_content(
    endpoint: &Endpoint,
    peer: &PublicKey,
    hash: &str,
) -> Result<Vec<String>, ProtocolError> {
    let (conn, mut send, mut recv) = open(endpoint, peer, ProtocolKind::GetContent).await?;
    let result = request_bucket_content(hash, &mut recv, &mut send).await;
    close(conn);
    result
}

pub async fn download<O>(
    endpoint: &Endpoint,
    peer: &PublicKey,
    hash: &str,
    name: &str,
    out: &mut O,
) -> Result<u64, ProtocolError>
where
    O: AsyncWrite + Unpin,
{
    let (conn, mut send, mut recv) = open(endpoint, peer, ProtocolKind::Download).await?;
    let result = request_download(hash, name, &mut recv, &mut send, out).await;
    close(conn);
    result
}
