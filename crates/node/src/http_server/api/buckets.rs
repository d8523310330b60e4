use axum::body::{Body, Bytes};
use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use common::bucket::{parse_bucket, serialize_bucket, BucketMessage, FileHeader};
use common::source::DataReader;

use super::response::{respond, ApiError};
use super::upload::{body_stream, content_type, DEFAULT_CONTENT_TYPE};
use crate::ServiceState;

const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Name of the bucket to create
    pub name: String,
}

fn reader_stream(
    reader: DataReader,
) -> impl futures::Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    futures::stream::try_unfold(reader, |mut reader| async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), reader)))
    })
}

pub async fn list(State(state): State<ServiceState>) -> Result<impl IntoResponse, ApiError> {
    let buckets = state.controller().list_buckets(None).await?;
    let messages: Vec<BucketMessage> = buckets.iter().map(BucketMessage::from).collect();
    Ok(respond(messages))
}

pub async fn create(
    State(state): State<ServiceState>,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("CREATE BUCKET: Received request to create bucket '{}'", req.name);

    if req.name.is_empty() {
        return Err(ApiError::BadRequest("name cannot be empty".into()));
    }

    let bucket = state.controller().create_bucket(&req.name, None).await?;
    tracing::info!(
        "CREATE BUCKET: Bucket '{}' created with hash {}",
        req.name,
        bucket.hash()
    );
    Ok((StatusCode::CREATED, respond(BucketMessage::from(&bucket))))
}

pub async fn content(
    State(state): State<ServiceState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let names = state.controller().get_bucket_content(&hash).await?;
    Ok(respond(names))
}

/// Save a bucket signed by its owner elsewhere. Echoes the serialized bucket.
pub async fn save(
    State(state): State<ServiceState>,
    Path(hash): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let bucket = parse_bucket(&hash, &body)?;
    state.controller().save_signed_bucket(&bucket).await?;
    let raw = serialize_bucket(&bucket)?;
    let echoed = String::from_utf8(raw).map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(%hash, "saved signed bucket");
    Ok(respond(echoed))
}

pub async fn download(
    State(state): State<ServiceState>,
    Path((hash, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (reader, data_ref) = state.controller().download(&hash, &name).await?;
    let content_type = if data_ref.header.content_type.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        data_ref.header.content_type.clone()
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, data_ref.header.size)
        .body(Body::from_stream(reader_stream(reader)))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Upload the request body into a bucket owned by this node.
pub async fn upload(
    State(state): State<ServiceState>,
    Path((hash, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let header = FileHeader::new(name, content_type(&headers));
    let data_ref = state
        .controller()
        .upload(&hash, header, body_stream(body), None)
        .await?;
    Ok(respond(data_ref))
}

pub async fn remove(
    State(state): State<ServiceState>,
    Path((hash, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let bucket = state.controller().remove(&hash, &name, None).await?;
    Ok(respond(BucketMessage::from(&bucket)))
}
