use std::path::PathBuf;
use std::time::Duration;

use crate::brand::Brand;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory store will be used
    pub sqlite_path: Option<PathBuf>,
    /// Upper bound on any single store call
    pub store_timeout: Duration,

    // access
    pub admin_secret: Option<String>,
    pub brand: Brand,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: 5050,
            sqlite_path: None,
            store_timeout: common::lifecycle::DEFAULT_STORE_TIMEOUT,
            admin_secret: None,
            brand: Brand::default(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
