use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::gate::SecretId;
use common::lifecycle::{LifecycleError, NewSecret};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

/// Upload of an already-encrypted secret
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreateRequest(pub NewSecret);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: SecretId,
}

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    body: Bytes,
) -> Result<impl IntoResponse, CreateError> {
    let value: Value = serde_json::from_slice(&body).map_err(|_| CreateError::InvalidJson)?;
    let new = NewSecret::from_value(&value)?;

    let id = state.secrets().create(new).await?;
    Ok(Json(CreateResponse { id }))
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<common::lifecycle::ValidationError> for CreateError {
    fn from(e: common::lifecycle::ValidationError) -> Self {
        CreateError::Lifecycle(LifecycleError::Validation(e))
    }
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CreateError::InvalidJson => (http::StatusCode::BAD_REQUEST, self.to_string()),
            CreateError::Lifecycle(LifecycleError::Validation(e)) => {
                tracing::debug!(field = e.field(), "rejected secret: {}", e);
                (http::StatusCode::BAD_REQUEST, e.to_string())
            }
            CreateError::Lifecycle(LifecycleError::NotFound) => (
                http::StatusCode::NOT_FOUND,
                super::NOT_FOUND_MESSAGE.to_string(),
            ),
            CreateError::Lifecycle(LifecycleError::Storage(e)) => {
                tracing::error!("failed to store secret: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "storage unavailable".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(super::SECRETS_PATH)?;
        Ok(client.post(full_url).json(&self))
    }
}
