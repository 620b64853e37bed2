//! Shared request state.

use crate::config::ServerConfig;
use crate::error::AppError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Single SQLite connection shared by all requests.
///
/// The lock is held only inside [`Database::with`], which is synchronous,
/// so it can never be held across an await point.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` with exclusive access to the connection.
    pub fn with<T, E>(&self, work: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))?;
        Ok(work(&conn)?)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(conn: Connection, config: ServerConfig) -> Self {
        Self {
            db: Database::new(conn),
            config: Arc::new(config),
        }
    }
}
