//! Request bodies handed to the controller as they arrive.
//!
//! axum bodies and multipart fields are not `Sync`, so their chunks are
//! relayed through a bounded channel into a [`ByteStream`].

use std::io;

use axum::body::{Body, Bytes};
use axum::extract::Multipart;
use futures::channel::{mpsc, oneshot};
use futures::{SinkExt, Stream, StreamExt};
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use common::bucket::FileHeader;
use common::source::ByteStream;

use super::response::ApiError;

pub(super) const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const RELAY_DEPTH: usize = 8;

/// Multipart field holding the uploaded file.
const FILE_FIELD: &str = "file";

pub(super) fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

async fn relay<S, E>(stream: S, mut tx: mpsc::Sender<io::Result<Bytes>>)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(io::Error::other);
        let failed = chunk.is_err();
        // a closed receiver means the upload was refused
        if tx.send(chunk).await.is_err() || failed {
            break;
        }
    }
}

pub(super) fn body_stream(body: Body) -> ByteStream {
    let (tx, rx) = mpsc::channel(RELAY_DEPTH);
    tokio::spawn(relay(body.into_data_stream(), tx));
    Box::pin(rx)
}

/// Find the `file` field and stream its content. Resolves once the field's
/// headers are read, before any of its data.
pub(super) async fn file_part(
    mut multipart: Multipart,
) -> Result<(FileHeader, ByteStream), ApiError> {
    let (found_tx, found_rx) = oneshot::channel::<Result<FileHeader, String>>();
    let (tx, rx) = mpsc::channel(RELAY_DEPTH);

    tokio::spawn(async move {
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => {
                    let _ = found_tx.send(Err("could not read file".into()));
                    return;
                }
                Err(e) => {
                    tracing::error!("Multipart parsing error: {}", e);
                    let _ = found_tx.send(Err(e.to_string()));
                    return;
                }
            };
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let filename = field.file_name().unwrap_or("unnamed").to_string();
            let mime = field.content_type().unwrap_or_default().to_string();
            if found_tx.send(Ok(FileHeader::new(filename, mime))).is_ok() {
                relay(field, tx).await;
            }
            return;
        }
    });

    let header = found_rx
        .await
        .map_err(|_| ApiError::Internal("multipart reader stopped".into()))?
        .map_err(ApiError::BadRequest)?;
    Ok((header, Box::pin(rx)))
}
