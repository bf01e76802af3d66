use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use common::lifecycle::SecretManager;

use crate::ServiceState;

/// Key read by the readiness probe; never written
const PROBE_KEY: &str = "_status:readyz";

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("key-value store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("key-value store did not answer within {0:?}")]
    StoreTimeout(Duration),
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready when the key-value store answers a read within the store timeout
pub(crate) struct StoreSource {
    secrets: SecretManager,
}

impl StoreSource {
    pub(crate) fn new(secrets: SecretManager) -> Self {
        Self { secrets }
    }
}

#[async_trait]
impl DataSource for StoreSource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        let store = self.secrets.store();
        let limit = self.secrets.store_timeout();
        tokio::time::timeout(limit, store.get(PROBE_KEY))
            .await
            .map_err(|_| DataSourceError::StoreTimeout(limit))?
            .map_err(|e| DataSourceError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(Arc::new(StoreSource::new(
            state.secrets().clone(),
        ))))
    }
}
