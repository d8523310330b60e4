use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use http::StatusCode;

use common::bucket::{parse_domain_record, serialize_domain_record};

use super::response::{respond, ApiError};
use crate::ServiceState;

/// Register a domain record signed by its publisher. A domain can only be
/// registered once.
pub async fn register(
    State(state): State<ServiceState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let record = parse_domain_record(&body)?;
    state.domains().register(&record).await?;
    tracing::info!(
        domain = record.domain(),
        hash = record.hash(),
        "domain registered"
    );
    Ok((StatusCode::CREATED, respond(record.hash().to_string())))
}

pub async fn resolve(
    State(state): State<ServiceState>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.domains().resolve(&domain).await?;
    let raw = serialize_domain_record(&record)?;
    let value: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(respond(value))
}
