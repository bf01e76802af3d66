pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "deadrop")]
#[command(about = "Share a secret that burns after a set number of views")]
#[command(version)]
pub struct Args {
    /// Daemon to talk to (defaults to localhost on the configured api_port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the deadrop config directory (defaults to ~/.deadrop)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
