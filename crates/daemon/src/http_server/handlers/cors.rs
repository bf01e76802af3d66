use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

/// Answers a bare `OPTIONS` that is not a CORS preflight
pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Preflights answered by `CorsLayer` come back as `200`; report them as `204`.
pub async fn no_content_preflight(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
