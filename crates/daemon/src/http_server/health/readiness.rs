use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use tokio::time::timeout;

use super::data_source::*;

/// Outer bound on the whole probe, above any configured store timeout
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    let err = match timeout(HEALTH_CHECK_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(())) => {
            let msg = serde_json::json!({"status": "ok"});
            return (StatusCode::OK, Json(msg)).into_response();
        }
        Ok(Err(e)) => e,
        Err(_) => DataSourceError::StoreTimeout(HEALTH_CHECK_TIMEOUT),
    };

    tracing::warn!("not ready: {}", err);
    let msg = serde_json::json!({
        "status": "failure",
        "dependency": "store",
        "message": err.to_string(),
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
}
