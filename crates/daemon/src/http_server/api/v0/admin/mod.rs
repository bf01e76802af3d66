use axum::routing::get;
use axum::Router;
use http::header::{ACCEPT, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod settings;

use crate::http_server::handlers::preflight_handler;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    // reads are public; writes get no CORS headers, so browsers only allow them same-origin
    let read_cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::OPTIONS])
        .allow_headers(vec![ACCEPT, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .route(
            "/settings",
            get(settings::get_handler)
                .options(preflight_handler)
                .layer(read_cors)
                .put(settings::put_handler),
        )
        .with_state(state)
}
