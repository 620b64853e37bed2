//! Manufacturer repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are ordered by `name ASC, id ASC`.
//! - Deleting a manufacturer cascades to its cars.

use crate::model::manufacturer::{Manufacturer, ManufacturerDraft, ManufacturerId};
use crate::repo::{count_to_u64, ensure_connection_ready, map_write_error, RepoError, RepoResult};
use crate::search::filter::TextFilter;
use crate::search::page::{Page, PageRequest};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ENTITY: &str = "manufacturer";

const MANUFACTURER_SELECT_SQL: &str = "SELECT id, name, country FROM manufacturers";

/// Query options for the manufacturer list.
#[derive(Debug, Clone, Default)]
pub struct ManufacturerListQuery {
    /// Case-insensitive substring match on `name`.
    pub name: Option<TextFilter>,
    pub page: PageRequest,
}

/// Repository interface for manufacturer CRUD operations.
pub trait ManufacturerRepository {
    fn create_manufacturer(&self, draft: &ManufacturerDraft) -> RepoResult<ManufacturerId>;
    fn update_manufacturer(&self, id: ManufacturerId, draft: &ManufacturerDraft)
        -> RepoResult<()>;
    fn get_manufacturer(&self, id: ManufacturerId) -> RepoResult<Option<Manufacturer>>;
    fn list_manufacturers(&self, query: &ManufacturerListQuery) -> RepoResult<Page<Manufacturer>>;
    /// Every manufacturer, for form choices.
    fn all_manufacturers(&self) -> RepoResult<Vec<Manufacturer>>;
    fn delete_manufacturer(&self, id: ManufacturerId) -> RepoResult<()>;
    fn count_manufacturers(&self) -> RepoResult<u64>;
}

/// SQLite-backed manufacturer repository.
pub struct SqliteManufacturerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteManufacturerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ManufacturerRepository for SqliteManufacturerRepository<'_> {
    fn create_manufacturer(&self, draft: &ManufacturerDraft) -> RepoResult<ManufacturerId> {
        draft.validate()?;
        self.conn
            .execute(
                "INSERT INTO manufacturers (name, country) VALUES (?1, ?2);",
                params![draft.name.trim(), draft.country.trim()],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_manufacturer(
        &self,
        id: ManufacturerId,
        draft: &ManufacturerDraft,
    ) -> RepoResult<()> {
        draft.validate()?;
        let changed = self
            .conn
            .execute(
                "UPDATE manufacturers SET name = ?1, country = ?2 WHERE id = ?3;",
                params![draft.name.trim(), draft.country.trim(), id],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_manufacturer(&self, id: ManufacturerId) -> RepoResult<Option<Manufacturer>> {
        let manufacturer = self
            .conn
            .query_row(
                &format!("{MANUFACTURER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_manufacturer_row,
            )
            .optional()?;
        Ok(manufacturer)
    }

    fn list_manufacturers(&self, query: &ManufacturerListQuery) -> RepoResult<Page<Manufacturer>> {
        let mut where_sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = query.name.as_ref() {
            where_sql.push_str(" AND ");
            where_sql.push_str(&TextFilter::sql_predicate("name"));
            bind_values.push(Value::Text(name.like_pattern()));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM manufacturers{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let total = count_to_u64(total)?;
        let (limit, offset) = query.page.window(total)?;

        let sql = format!("{MANUFACTURER_SELECT_SQL}{where_sql} ORDER BY name ASC, id ASC LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(bind_values), parse_manufacturer_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            number: query.page.number,
            size: query.page.size,
        })
    }

    fn all_manufacturers(&self) -> RepoResult<Vec<Manufacturer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MANUFACTURER_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let items = stmt
            .query_map([], parse_manufacturer_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn delete_manufacturer(&self, id: ManufacturerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM manufacturers WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn count_manufacturers(&self) -> RepoResult<u64> {
        let total: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM manufacturers;", [], |row| row.get(0))?;
        count_to_u64(total)
    }
}

pub(crate) fn parse_manufacturer_row(row: &Row<'_>) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: row.get("id")?,
        name: row.get("name")?,
        country: row.get("country")?,
    })
}
