use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::brand::Brand;

pub const APP_NAME: &str = "deadrop";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
/// Overrides `admin_secret` from the config file when set
pub const ADMIN_SECRET_ENV: &str = "DEADROP_ADMIN_SECRET";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Public origin that share links point at (e.g. "https://drop.example.com")
    #[serde(default)]
    pub public_url: Option<Url>,
    /// Upper bound on any single store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Bearer token for privileged writes; unset disables them
    #[serde(default)]
    pub admin_secret: Option<String>,
    /// Key-value backend for secrets and brand settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Brand settings served when a host has no stored override
    #[serde(default)]
    pub brand: Brand,
}

fn default_api_port() -> u16 {
    5050
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            public_url: None,
            store_timeout_ms: default_store_timeout_ms(),
            admin_secret: None,
            store: StoreConfig::default(),
            brand: Brand::default(),
        }
    }
}

/// Where secrets are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process memory; everything is lost on restart
    Memory,

    /// SQLite database file
    Sqlite {
        /// Path to the database (defaults to deadrop_dir/db.sqlite)
        path: Option<PathBuf>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite { path: None }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the deadrop directory (~/.deadrop)
    pub deadrop_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the deadrop directory path (custom or default ~/.deadrop)
    pub fn deadrop_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new deadrop state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let deadrop_dir = Self::deadrop_dir(custom_path)?;

        if deadrop_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }
        fs::create_dir_all(&deadrop_dir)?;

        let config = config.unwrap_or_default();
        let config_path = deadrop_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            deadrop_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the deadrop directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let deadrop_dir = Self::deadrop_dir(custom_path)?;

        if !deadrop_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = deadrop_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            deadrop_dir,
            config_path,
            config,
        })
    }

    /// Database file for the sqlite backend, if that backend is configured
    pub fn db_path(&self) -> Option<PathBuf> {
        match &self.config.store {
            StoreConfig::Memory => None,
            StoreConfig::Sqlite { path } => Some(
                path.clone()
                    .unwrap_or_else(|| self.deadrop_dir.join(DB_FILE_NAME)),
            ),
        }
    }

    /// The admin secret, with the environment taking precedence over the config file.
    /// Empty values count as unset.
    pub fn admin_secret(&self) -> Option<String> {
        std::env::var(ADMIN_SECRET_ENV)
            .ok()
            .or_else(|| self.config.admin_secret.clone())
            .filter(|secret| !secret.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("deadrop directory not initialized. Run 'deadrop init' first")]
    NotInitialized,

    #[error("deadrop directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("deadrop");

        let config = AppConfig {
            api_port: 6060,
            public_url: Some(Url::parse("https://drop.example.com").unwrap()),
            ..Default::default()
        };
        let created = AppState::init(Some(dir.clone()), Some(config.clone())).unwrap();
        assert!(created.config_path.exists());

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.db_path(), Some(dir.join(DB_FILE_NAME)));

        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
        assert!(matches!(
            AppState::load(Some(temp.path().to_path_buf())),
            Err(StateError::MissingFile(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r##"
            api_port = 7000

            [store]
            type = "memory"

            [brand]
            name = "Acme"
            tagline = "Secrets, handled"
            primaryColor = "#123"
            domain = "acme.test"
            supportEmail = "help@acme.test"
            "##,
        )
        .unwrap();

        assert_eq!(config.api_port, 7000);
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.store_timeout_ms, 5_000);
        assert_eq!(config.brand.name, "Acme");
        assert_eq!(config.brand.logo, None);
    }

    #[test]
    fn test_store_defaults_to_sqlite() {
        assert_eq!(StoreConfig::default(), StoreConfig::Sqlite { path: None });

        let config: AppConfig = toml::from_str("api_port = 7000").unwrap();
        assert_eq!(config.store, StoreConfig::Sqlite { path: None });

        let rendered = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
