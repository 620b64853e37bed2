//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Write paths validate drafts before SQL mutations.
//! - Repositories only accept connections migrated to the latest schema.
//! - Unique/foreign-key violations surface as semantic errors, not raw SQLite errors.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::ValidationError;
use crate::search::page::PageError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod car_repo;
pub mod driver_repo;
pub mod manufacturer_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all entity repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: i64,
    },
    /// Unique constraint violated on `field`.
    Conflict {
        entity: &'static str,
        field: String,
    },
    /// Written `entity` row has a foreign key pointing at a missing row.
    InvalidReference(&'static str),
    Page(PageError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { entity, field } => {
                write!(f, "{entity} with this {field} already exists")
            }
            Self::InvalidReference(entity) => write!(f, "{entity} references a missing row"),
            Self::Page(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Page(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PageError> for RepoError {
    fn from(value: PageError) -> Self {
        Self::Page(value)
    }
}

/// Rejects connections that did not go through `open_db*` migrations.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Maps constraint failures of a write on `entity` to semantic errors.
pub(crate) fn map_write_error(entity: &'static str, err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
                let field = columns
                    .split(", ")
                    .map(|column| column.rsplit('.').next().unwrap_or(column))
                    .collect::<Vec<_>>()
                    .join(", ");
                return RepoError::Conflict { entity, field };
            }
            if message.contains("FOREIGN KEY constraint failed") {
                return RepoError::InvalidReference(entity);
            }
        }
    }
    RepoError::from(err)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(table_column: &str, value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {table_column}"
        ))),
    }
}

pub(crate) fn count_to_u64(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}
