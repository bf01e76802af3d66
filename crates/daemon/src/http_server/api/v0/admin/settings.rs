use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use http::header::{AUTHORIZATION, HOST};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::store::KvError;

use crate::brand::{Brand, BrandError, BrandUpdate};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub brand: Brand,
}

/// Lowercased host of the request, without any port
fn request_hostname(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(HOST)?.to_str().ok()?.trim();
    let hostname = match host.strip_prefix('[') {
        // [v6]:port
        Some(rest) => &host[..rest.find(']')? + 2],
        None => host.split(':').next()?,
    };
    (!hostname.is_empty()).then(|| hostname.to_ascii_lowercase())
}

#[tracing::instrument(skip_all)]
pub async fn get_handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SettingsError> {
    let hostname = request_hostname(&headers);
    let brand = state.brand().load(hostname.as_deref()).await?;
    Ok(Json(SettingsResponse { brand }))
}

#[tracing::instrument(skip_all)]
pub async fn put_handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, SettingsError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    state.admin().authorize(authorization).map_err(|_| {
        tracing::warn!("rejected unauthorized settings update");
        SettingsError::Unauthorized
    })?;

    let body: Value = serde_json::from_slice(&body).map_err(|_| SettingsError::InvalidJson)?;
    let update = BrandUpdate::from_body(&body)?;
    let hostname = request_hostname(&headers).ok_or(SettingsError::MissingHost)?;

    let brand = state.brand().save(&hostname, update).await?;
    Ok(Json(SettingsResponse { brand }))
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Missing Host header")]
    MissingHost,
    #[error(transparent)]
    Brand(#[from] BrandError),
}

impl From<KvError> for SettingsError {
    fn from(e: KvError) -> Self {
        SettingsError::Brand(BrandError::Storage(e))
    }
}

impl IntoResponse for SettingsError {
    fn into_response(self) -> Response {
        let status = match &self {
            SettingsError::Unauthorized => StatusCode::UNAUTHORIZED,
            SettingsError::InvalidJson
            | SettingsError::MissingHost
            | SettingsError::Brand(BrandError::MissingBrand)
            | SettingsError::Brand(BrandError::InvalidColor) => StatusCode::BAD_REQUEST,
            SettingsError::Brand(BrandError::Storage(e)) => {
                tracing::error!("brand settings storage failed: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "storage unavailable" })),
                )
                    .into_response();
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
