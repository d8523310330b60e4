use axum::routing::{get, post};
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod buckets;
pub mod client;
pub mod data;
pub mod domains;
pub mod response;
mod upload;

pub use buckets::CreateRequest;
pub use client::{ApiClient, ClientError};
pub use response::{not_found, ApiError, Envelope};

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .route("/buckets", get(buckets::list).post(buckets::create))
        .route("/buckets/:hash", get(buckets::content).post(buckets::save))
        .route(
            "/buckets/:hash/:name",
            get(buckets::download)
                .post(buckets::upload)
                .delete(buckets::remove),
        )
        .route("/file", post(data::upload_file))
        .route("/data/:name", post(data::upload_data))
        .route("/domains", post(domains::register))
        .route("/domains/:domain", get(domains::resolve))
        .with_state(state)
        .layer(cors_layer)
}
