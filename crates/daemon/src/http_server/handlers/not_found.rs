use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::http_server::api::v0::secrets;

pub async fn not_found_handler(uri: Uri, headers: HeaderMap) -> Response {
    // keep missing secrets indistinguishable, whatever the id looks like
    if secrets::is_unrouted_secret_path(uri.path()) {
        return secrets::not_found_response();
    }

    let accept = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok());

    match accept {
        Some(accept_str) if accept_str.contains("application/json") => {
            let err_msg = serde_json::json!({"error": "not found"});
            (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "not found",
        )
            .into_response(),
    }
}
