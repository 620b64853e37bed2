//! Driver repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are ordered by `id ASC`.
//! - `license_number` uniqueness is enforced by the schema and reported as `Conflict`.
//! - Password hashes are only exposed through [`DriverCredentials`].

use crate::model::driver::{validate_license_number, Driver, DriverDraft, DriverId};
use crate::model::ValidationError;
use crate::repo::{
    bool_to_int, count_to_u64, ensure_connection_ready, int_to_bool, map_write_error, RepoError,
    RepoResult,
};
use crate::search::filter::TextFilter;
use crate::search::page::{Page, PageRequest};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ENTITY: &str = "driver";

pub(crate) const DRIVER_COLUMNS: &str = "drivers.id AS id,
    drivers.username AS username,
    drivers.first_name AS first_name,
    drivers.last_name AS last_name,
    drivers.email AS email,
    drivers.license_number AS license_number,
    drivers.is_staff AS is_staff,
    drivers.is_superuser AS is_superuser,
    drivers.date_joined AS date_joined";

/// Query options for the driver list.
#[derive(Debug, Clone, Default)]
pub struct DriverListQuery {
    /// Case-insensitive substring match on `username`.
    pub username: Option<TextFilter>,
    pub page: PageRequest,
}

/// Stored login material for one driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCredentials {
    pub id: DriverId,
    pub password_hash: String,
}

/// Repository interface for driver accounts.
pub trait DriverRepository {
    fn create_driver(&self, draft: &DriverDraft, password_hash: &str) -> RepoResult<DriverId>;
    /// Replaces the license number; `None` clears it.
    fn update_license_number(&self, id: DriverId, license_number: Option<&str>)
        -> RepoResult<()>;
    fn get_driver(&self, id: DriverId) -> RepoResult<Option<Driver>>;
    fn find_credentials(&self, username: &str) -> RepoResult<Option<DriverCredentials>>;
    /// Whether a driver other than `except` already uses `username`.
    fn username_taken(&self, username: &str, except: Option<DriverId>) -> RepoResult<bool>;
    /// Whether a driver other than `except` already holds `license_number`.
    fn license_number_taken(&self, license_number: &str, except: Option<DriverId>)
        -> RepoResult<bool>;
    fn list_drivers(&self, query: &DriverListQuery) -> RepoResult<Page<Driver>>;
    /// Every driver, for form choices.
    fn all_drivers(&self) -> RepoResult<Vec<Driver>>;
    fn delete_driver(&self, id: DriverId) -> RepoResult<()>;
    fn count_drivers(&self) -> RepoResult<u64>;
}

/// SQLite-backed driver repository.
pub struct SqliteDriverRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDriverRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SqliteDriverRepository<'_> {
    fn column_taken(
        &self,
        column: &'static str,
        value: &str,
        except: Option<DriverId>,
    ) -> RepoResult<bool> {
        let taken: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM drivers WHERE {column} = ?1 AND id IS NOT ?2);"),
            params![value, except],
            |row| row.get(0),
        )?;
        Ok(taken != 0)
    }
}

impl DriverRepository for SqliteDriverRepository<'_> {
    fn create_driver(&self, draft: &DriverDraft, password_hash: &str) -> RepoResult<DriverId> {
        draft.validate()?;
        if password_hash.is_empty() {
            return Err(RepoError::InvalidData(
                "driver password hash cannot be empty".to_string(),
            ));
        }

        self.conn
            .execute(
                "INSERT INTO drivers (
                    username,
                    password_hash,
                    first_name,
                    last_name,
                    email,
                    license_number,
                    is_staff,
                    is_superuser
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    draft.username.as_str(),
                    password_hash,
                    draft.first_name.trim(),
                    draft.last_name.trim(),
                    draft.email.trim(),
                    draft.license_number.as_deref(),
                    bool_to_int(draft.is_staff),
                    bool_to_int(draft.is_superuser),
                ],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_license_number(
        &self,
        id: DriverId,
        license_number: Option<&str>,
    ) -> RepoResult<()> {
        if let Some(value) = license_number {
            validate_license_number(value).map_err(ValidationError::InvalidLicenseNumber)?;
        }

        let changed = self
            .conn
            .execute(
                "UPDATE drivers SET license_number = ?1 WHERE id = ?2;",
                params![license_number, id],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_driver(&self, id: DriverId) -> RepoResult<Option<Driver>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_driver_row(row)?));
        }
        Ok(None)
    }

    fn find_credentials(&self, username: &str) -> RepoResult<Option<DriverCredentials>> {
        let credentials = self
            .conn
            .query_row(
                "SELECT id, password_hash FROM drivers WHERE username = ?1;",
                [username],
                |row| {
                    Ok(DriverCredentials {
                        id: row.get(0)?,
                        password_hash: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    fn username_taken(&self, username: &str, except: Option<DriverId>) -> RepoResult<bool> {
        self.column_taken("username", username, except)
    }

    fn license_number_taken(
        &self,
        license_number: &str,
        except: Option<DriverId>,
    ) -> RepoResult<bool> {
        self.column_taken("license_number", license_number, except)
    }

    fn list_drivers(&self, query: &DriverListQuery) -> RepoResult<Page<Driver>> {
        let mut where_sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(username) = query.username.as_ref() {
            where_sql.push_str(" AND ");
            where_sql.push_str(&TextFilter::sql_predicate("drivers.username"));
            bind_values.push(Value::Text(username.like_pattern()));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM drivers{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let total = count_to_u64(total)?;
        let (limit, offset) = query.page.window(total)?;

        let sql = format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers{where_sql} ORDER BY drivers.id ASC LIMIT ? OFFSET ?;"
        );
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_driver_row(row)?);
        }

        Ok(Page {
            items,
            total,
            number: query.page.number,
            size: query.page.size,
        })
    }

    fn all_drivers(&self) -> RepoResult<Vec<Driver>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY drivers.id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_driver_row(row)?);
        }
        Ok(items)
    }

    fn delete_driver(&self, id: DriverId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM drivers WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn count_drivers(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM drivers;", [], |row| row.get(0))?;
        count_to_u64(total)
    }
}

/// Parses a row selected with [`DRIVER_COLUMNS`].
pub(crate) fn parse_driver_row(row: &Row<'_>) -> RepoResult<Driver> {
    Ok(Driver {
        id: row.get("id")?,
        username: row.get("username")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        license_number: row.get("license_number")?,
        is_staff: int_to_bool("drivers.is_staff", row.get("is_staff")?)?,
        is_superuser: int_to_bool("drivers.is_superuser", row.get("is_superuser")?)?,
        date_joined: row.get("date_joined")?,
    })
}
