use axum::routing::get;
use axum::Router;

mod identity;
mod livez;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(livez::handler))
        .route("/identity", get(identity::handler))
        .with_state(state)
}
