//! Server configuration from environment variables.
//!
//! # Invariants
//! - Every setting has a default; only malformed values are errors.
//! - `page_size` and `session_ttl` are never zero.

use fleet_core::session::DEFAULT_SESSION_TTL_SECS;
use fleet_core::DEFAULT_PAGE_SIZE;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "FLEET_BIND_ADDR";
pub const ENV_DB_PATH: &str = "FLEET_DB_PATH";
pub const ENV_PAGE_SIZE: &str = "FLEET_PAGE_SIZE";
pub const ENV_SESSION_TTL_SECS: &str = "FLEET_SESSION_TTL_SECS";
pub const ENV_LOG_LEVEL: &str = "FLEET_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FLEET_LOG_DIR";

const DEFAULT_DB_PATH: &str = "fleet.sqlite3";

/// Malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} value `{}`: {}",
            self.variable, self.value, self.reason
        )
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub page_size: u32,
    pub session_ttl: Duration,
    /// `None` means the default level for the build mode.
    pub log_level: Option<String>,
    /// Absolute directory for rotating log files; `None` logs to stderr.
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            log_level: None,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let bind_addr = match get(ENV_BIND_ADDR) {
            Some(raw) => parse_bind_addr(ENV_BIND_ADDR, &raw)?,
            None => defaults.bind_addr,
        };
        let page_size = match get(ENV_PAGE_SIZE) {
            Some(raw) => parse_positive(ENV_PAGE_SIZE, &raw)?,
            None => defaults.page_size,
        };
        let session_ttl = match get(ENV_SESSION_TTL_SECS) {
            Some(raw) => Duration::from_secs(u64::from(parse_positive(
                ENV_SESSION_TTL_SECS,
                &raw,
            )?)),
            None => defaults.session_ttl,
        };

        Ok(Self {
            bind_addr,
            db_path: get(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            page_size,
            session_ttl,
            log_level: get(ENV_LOG_LEVEL),
            log_dir: get(ENV_LOG_DIR),
        })
    }
}

/// Parses a `host:port` socket address.
pub fn parse_bind_addr(variable: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.parse().map_err(|err: std::net::AddrParseError| ConfigError {
        variable,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn parse_positive(variable: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(0) => Err(ConfigError {
            variable,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(err) => Err(ConfigError {
            variable,
            value: raw.to_string(),
            reason: err.to_string(),
        }),
    }
}
