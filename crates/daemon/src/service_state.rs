use std::sync::Arc;

use common::gate::AdminGate;
use common::lifecycle::SecretManager;
use common::store::{KvStore, MemoryKvStore};

use crate::brand::BrandSettings;
use crate::database::{Database, DatabaseSetupError, SqliteKvStore};
use crate::service_config::Config;

/// Main service state, shared by every request handler
#[derive(Clone, Debug)]
pub struct State {
    secrets: SecretManager,
    brand: BrandSettings,
    admin: Arc<AdminGate>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let store: Arc<dyn KvStore> = match &config.sqlite_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "opening sqlite store");
                let store = SqliteKvStore::new(Database::connect(path).await?);
                match store.purge_expired().await {
                    Ok(purged) => tracing::info!(purged, "swept expired entries"),
                    Err(e) => tracing::warn!("failed to sweep expired entries: {}", e),
                }
                Arc::new(store)
            }
            None => {
                tracing::warn!("using in-memory store; secrets will not survive a restart");
                Arc::new(MemoryKvStore::new())
            }
        };

        let state = Self::new(store, config);

        if !state.admin.is_configured() {
            tracing::warn!("no admin secret configured; brand settings are read-only");
        }
        Ok(state)
    }

    /// Build state over an existing store
    pub fn new(store: Arc<dyn KvStore>, config: &Config) -> Self {
        let secrets = SecretManager::new(store.clone()).with_store_timeout(config.store_timeout);
        let brand = BrandSettings::new(store, config.brand.clone(), config.store_timeout);
        Self {
            secrets,
            brand,
            admin: Arc::new(AdminGate::new(config.admin_secret.as_deref())),
        }
    }

    pub fn secrets(&self) -> &SecretManager {
        &self.secrets
    }

    pub fn brand(&self) -> &BrandSettings {
        &self.brand
    }

    pub fn admin(&self) -> &AdminGate {
        &self.admin
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
}
