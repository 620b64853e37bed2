//! `fleet` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from environment and flags, then dispatch commands.
//! - Report failures as `Error: ...` with exit status 1.

mod cli;

use cli::{CommandLine, Commands};
use fleet_core::service::driver_service::DriverService;
use fleet_core::{core_version, default_log_level, init_logging, init_stderr_logging, open_db};
use fleet_web::config::ServerConfig;
use log::info;
use std::path::Path;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();
    match run(commands).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(commands: CommandLine) -> Result<(), String> {
    let mut config = ServerConfig::from_env().map_err(|err| err.to_string())?;
    if commands.log_level.is_some() {
        config.log_level = commands.log_level;
    }
    if commands.log_dir.is_some() {
        config.log_dir = commands.log_dir;
    }

    match commands.command {
        Commands::Version => {
            println!("fleet {}", core_version());
            Ok(())
        }
        Commands::Serve { bind, db } => {
            start_logging(&config)?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            fleet_web::serve(config).await.map_err(|err| err.to_string())
        }
        Commands::Migrate { db } => {
            start_logging(&config)?;
            let path = db.unwrap_or(config.db_path);
            migrate(&path)?;
            println!("database ready: {}", path.display());
            Ok(())
        }
        Commands::CreateSuperuser {
            username,
            password,
            license_number,
            db,
        } => {
            start_logging(&config)?;
            let path = db.unwrap_or(config.db_path);
            let id = create_superuser(&path, &username, &password, license_number.as_deref())?;
            println!("superuser `{username}` created with id {id}");
            Ok(())
        }
    }
}

fn start_logging(config: &ServerConfig) -> Result<(), String> {
    let level = log_level(config);
    match config.log_dir.as_deref() {
        Some(dir) => init_logging(level, dir),
        None => init_stderr_logging(level),
    }
}

/// Configured level, or the build-mode default.
fn log_level(config: &ServerConfig) -> &str {
    config
        .log_level
        .as_deref()
        .unwrap_or_else(|| default_log_level())
}

fn migrate(path: &Path) -> Result<(), String> {
    open_db(path).map_err(|err| err.to_string())?;
    info!("event=cli_migrate module=cli status=ok");
    Ok(())
}

fn create_superuser(
    path: &Path,
    username: &str,
    password: &str,
    license_number: Option<&str>,
) -> Result<i64, String> {
    let conn = open_db(path).map_err(|err| err.to_string())?;
    DriverService::from_connection(&conn)
        .and_then(|service| service.create_superuser(username, password, license_number))
        .map_err(|err| err.to_string())
}
