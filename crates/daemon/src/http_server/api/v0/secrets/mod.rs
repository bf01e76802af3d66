use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use tower_http::cors::{Any, CorsLayer};

pub mod create;
pub mod retrieve;

use crate::http_server::handlers::preflight_handler;
use crate::ServiceState;

/// Generic body for every "no such secret" outcome
pub const NOT_FOUND_MESSAGE: &str = "Secret not found or already burned";

/// Absolute path the secrets router is mounted at
pub const SECRETS_PATH: &str = "/api/v0/secrets";

/// The one response for any secret that cannot be served
pub fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": NOT_FOUND_MESSAGE })),
    )
        .into_response()
}

/// True for paths under the secrets router that no route matched, such as
///  an empty id or an id containing `/`
pub fn is_unrouted_secret_path(path: &str) -> bool {
    path.strip_prefix(SECRETS_PATH)
        .is_some_and(|rest| rest.starts_with('/'))
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    // secrets are fetched from share pages on any origin
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", post(create::handler).options(preflight_handler))
        .route("/:id", get(retrieve::handler).options(preflight_handler))
        .with_state(state)
        .layer(cors_layer)
}
