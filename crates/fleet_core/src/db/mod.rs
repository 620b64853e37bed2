//! Fleet database: connection setup and schema versions.
//!
//! The schema holds `manufacturers`, `cars`, the `car_drivers` join table,
//! `drivers` and `sessions`. Its version lives in `PRAGMA user_version`.
//!
//! # Invariants
//! - `open_db*` returns connections with every migration applied.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to open or migrate the fleet database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Stored schema version `found` is above the newest one this build knows.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "fleet schema v{found} is newer than this build supports (v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn schema_too_new_names_both_versions() {
        let err = DbError::SchemaTooNew {
            found: 7,
            supported: 2,
        };
        assert_eq!(
            err.to_string(),
            "fleet schema v7 is newer than this build supports (v2)"
        );
        assert!(err.source().is_none());
    }
}
