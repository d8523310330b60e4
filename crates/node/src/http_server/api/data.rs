use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use http::HeaderMap;

use common::bucket::FileHeader;

use super::response::{respond, ApiError};
use super::upload::{body_stream, content_type, file_part};
use crate::ServiceState;

/// Store the multipart field `file` outside of any bucket.
pub async fn upload_file(
    State(state): State<ServiceState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (header, data) = file_part(multipart).await?;
    tracing::info!(filename = %header.filename, "storing uploaded file");
    let data_ref = state.controller().upload_data(header, data).await?;
    Ok(respond(data_ref))
}

/// Store the raw request body under `name` outside of any bucket.
pub async fn upload_data(
    State(state): State<ServiceState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let header = FileHeader::new(name, content_type(&headers));
    let data_ref = state
        .controller()
        .upload_data(header, body_stream(body))
        .await?;
    Ok(respond(data_ref))
}
