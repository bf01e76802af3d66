use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use http::header::CACHE_CONTROL;
use reqwest::{Client, RequestBuilder, Url};

use common::crypto::Envelope;
use common::gate::SecretId;
use common::lifecycle::LifecycleError;

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

/// Consume one view of a secret
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub id: SecretId,
}

/// Ciphertext and nonce only; policy and counters never leave the server
pub type RetrieveResponse = Envelope;

#[tracing::instrument(skip(state))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, RetrieveError> {
    let envelope = state.secrets().retrieve_and_consume_view(&id).await?;
    Ok(([(CACHE_CONTROL, "no-store")], Json(envelope)))
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl IntoResponse for RetrieveError {
    fn into_response(self) -> Response {
        let RetrieveError::Lifecycle(e) = self;
        match e {
            LifecycleError::Storage(e) => {
                tracing::error!("failed to read secret: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "storage unavailable" })),
                )
                    .into_response()
            }
            // nothing distinguishes malformed, missing, burned and expired
            LifecycleError::NotFound | LifecycleError::Validation(_) => {
                super::not_found_response()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for RetrieveRequest {
    type Response = RetrieveResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!("{}/{}", super::SECRETS_PATH, self.id))?;
        Ok(client.get(full_url))
    }
}
