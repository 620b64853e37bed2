//! HTTP surface of the fleet service.
//!
//! # Responsibility
//! - Expose fleet pages over `axum`, gated by session login.
//! - Own process-level serving: database opening, listener binding, shutdown.
//!
//! # Invariants
//! - Handlers never hold the database lock across an await point.
//! - Every page answers JSON `{"page", "context"}` or a `302` redirect.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod session;

use app_state::AppState;
use axum::Router;
use config::ServerConfig;
use fleet_core::{open_db, DbError, SessionStore, SqliteSessionStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Builds the application router over `state`.
pub fn build_app(state: AppState) -> Router {
    routes::router(state)
}

#[derive(Debug)]
pub enum ServeError {
    Db(DbError),
    Io(std::io::Error),
}

impl Display for ServeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Io(err) => write!(f, "server error: {err}"),
        }
    }
}

impl Error for ServeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<DbError> for ServeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<std::io::Error> for ServeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Opens the database, binds `config.bind_addr` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    let conn = open_db(&config.db_path)?;
    match SqliteSessionStore::try_new(&conn).and_then(|store| store.clear_expired()) {
        Ok(removed) => info!("event=session_cleanup module=web status=ok removed={removed}"),
        Err(err) => warn!("event=session_cleanup module=web status=error error={err}"),
    }

    let bind_addr = config.bind_addr;
    let app = build_app(AppState::new(conn, config));
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(
        "event=server_start module=web status=ok addr={}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_stop module=web status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_signal module=web status=error error={err}");
    }
}
