use clap::Args;
use url::Url;

use deadrop_daemon::state::{AppConfig, AppState, StoreConfig};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 5050)]
    pub api_port: u16,

    /// Public origin that share links point at (e.g. https://drop.example.com)
    #[arg(long)]
    pub public_url: Option<Url>,

    /// Keep secrets in memory only; nothing survives a restart
    #[arg(long)]
    pub memory: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] deadrop_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = if self.memory {
            StoreConfig::Memory
        } else {
            StoreConfig::Sqlite { path: None }
        };
        let config = AppConfig {
            api_port: self.api_port,
            public_url: self.public_url.clone(),
            store,
            ..Default::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let store_str = match state.db_path() {
            Some(path) => format!("sqlite ({})", path.display()),
            None => "memory".to_string(),
        };
        let public_url_str = state
            .config
            .public_url
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_else(|| "unset (links use the daemon address)".to_string());

        Ok(format!(
            "Initialized deadrop directory at: {}\n\
             - Config: {}\n\
             - Store: {}\n\
             - API port: {}\n\
             - Public URL: {}",
            state.deadrop_dir.display(),
            state.config_path.display(),
            store_str,
            state.config.api_port,
            public_url_str,
        ))
    }
}
