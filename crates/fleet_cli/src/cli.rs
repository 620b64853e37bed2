//! Command-line definition.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fleet")]
#[command(about = "Taxi fleet manager: manufacturers, cars and drivers.")]
pub struct CommandLine {
    /// Log level (trace|debug|info|warn|error); overrides FLEET_LOG_LEVEL
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Absolute directory for log files; overrides FLEET_LOG_DIR
    #[arg(long, global = true)]
    pub log_dir: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the web application
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Create or upgrade the database schema
    Migrate {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Create a staff account with full access
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        license_number: Option<String>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the version
    Version,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
