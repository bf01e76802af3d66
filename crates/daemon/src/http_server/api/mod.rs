use axum::middleware;
use axum::Router;

pub mod client;
pub mod v0;

use super::handlers::no_content_preflight;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    // cross-origin policy differs per route, so CORS layers live with the routes
    Router::new()
        .nest("/v0", v0::router(state.clone()))
        .with_state(state)
        .layer(middleware::from_fn(no_content_preflight))
}
