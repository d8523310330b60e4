use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{StatusCode, Uri};
use serde::Serialize;
use time::OffsetDateTime;

use common::bucket::BucketError;
use common::controller::ControllerError;
use common::source::SourceError;

/// Every successful JSON response: `{"data": ..., "time": <unix seconds>}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub time: i64,
}

pub fn respond<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        data,
        time: OffsetDateTime::now_utc().unix_timestamp(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Controller(#[from] ControllerError),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Bucket(#[from] BucketError),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

fn bucket_status(_err: &BucketError) -> StatusCode {
    // every bucket error is a malformed or unauthenticated payload
    StatusCode::BAD_REQUEST
}

fn source_status(err: &SourceError) -> StatusCode {
    match err {
        SourceError::NotFound(_) => StatusCode::NOT_FOUND,
        SourceError::AlreadyExists(_) => StatusCode::CONFLICT,
        SourceError::Bucket(e) => bucket_status(e),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Controller(e) => match e {
                ControllerError::AlreadyExists(_) => StatusCode::CONFLICT,
                ControllerError::BucketNotExist(_) => StatusCode::NOT_FOUND,
                ControllerError::CouldNotUpdateBucketNode => StatusCode::INTERNAL_SERVER_ERROR,
                ControllerError::Bucket(e) => bucket_status(e),
                ControllerError::Source(e) => source_status(e),
            },
            ApiError::Source(e) => source_status(e),
            ApiError::Bucket(e) => bucket_status(e),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("API ERROR: {:?}", self);
        } else {
            tracing::warn!("API request rejected: {}", self);
        }
        let msg = serde_json::json!({"error": self.to_string()});
        (status, Json(msg)).into_response()
    }
}

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(ControllerError::AlreadyExists("h".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(ControllerError::BucketNotExist("h".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(ControllerError::Source(SourceError::NotFound("x".into()))),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(BucketError::PkConflict),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::NotFound("/nope".into()), StatusCode::NOT_FOUND),
            (
                ApiError::from(SourceError::Codec("bad".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{}", err);
        }
    }
}
