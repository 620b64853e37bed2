//! Car repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist cars together with their driver membership set.
//! - Assemble the `Car` read model (manufacturer + drivers) for pages.
//!
//! # Invariants
//! - Car rows and `car_drivers` rows are written in one transaction.
//! - Lists are ordered by `id ASC`; assigned drivers by driver `id ASC`.
//! - Unknown manufacturer or driver ids surface as `InvalidReference`.

use crate::model::car::{Car, CarDraft, CarId};
use crate::model::driver::{Driver, DriverId};
use crate::model::manufacturer::{Manufacturer, ManufacturerId};
use crate::repo::driver_repo::{parse_driver_row, DRIVER_COLUMNS};
use crate::repo::{count_to_u64, ensure_connection_ready, map_write_error, RepoError, RepoResult};
use crate::search::filter::TextFilter;
use crate::search::page::{Page, PageRequest};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ENTITY: &str = "car";

const CAR_SELECT_SQL: &str = "SELECT
    cars.id AS car_id,
    cars.model AS car_model,
    manufacturers.id AS manufacturer_id,
    manufacturers.name AS manufacturer_name,
    manufacturers.country AS manufacturer_country
FROM cars
JOIN manufacturers ON manufacturers.id = cars.manufacturer_id";

/// Query options for the car list. Both filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct CarListQuery {
    /// Case-insensitive substring match on `model`.
    pub model: Option<TextFilter>,
    /// Exact manufacturer match.
    pub manufacturer_id: Option<ManufacturerId>,
    pub page: PageRequest,
}

/// Repository interface for cars and driver assignments.
pub trait CarRepository {
    fn create_car(&self, draft: &CarDraft) -> RepoResult<CarId>;
    /// Replaces model, manufacturer and the whole driver set.
    fn update_car(&self, id: CarId, draft: &CarDraft) -> RepoResult<()>;
    fn get_car(&self, id: CarId) -> RepoResult<Option<Car>>;
    fn list_cars(&self, query: &CarListQuery) -> RepoResult<Page<Car>>;
    fn delete_car(&self, id: CarId) -> RepoResult<()>;
    fn count_cars(&self) -> RepoResult<u64>;
    /// Flips membership of `driver_id`; returns `true` when now assigned.
    fn toggle_driver(&self, car_id: CarId, driver_id: DriverId) -> RepoResult<bool>;
    /// Cars assigned to `driver_id`, ordered by car id.
    fn cars_for_driver(&self, driver_id: DriverId) -> RepoResult<Vec<Car>>;
}

/// SQLite-backed car repository.
pub struct SqliteCarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCarRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert_memberships(
        conn: &Connection,
        car_id: CarId,
        draft: &CarDraft,
    ) -> RepoResult<()> {
        let mut stmt =
            conn.prepare("INSERT INTO car_drivers (car_id, driver_id) VALUES (?1, ?2);")?;
        for driver_id in &draft.driver_ids {
            stmt.execute(params![car_id, driver_id])
                .map_err(|err| map_write_error(ENTITY, err))?;
        }
        Ok(())
    }

    fn load_drivers(&self, car_id: CarId) -> RepoResult<Vec<Driver>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DRIVER_COLUMNS}
             FROM drivers
             JOIN car_drivers ON car_drivers.driver_id = drivers.id
             WHERE car_drivers.car_id = ?1
             ORDER BY drivers.id ASC;"
        ))?;
        let mut rows = stmt.query([car_id])?;
        let mut drivers = Vec::new();
        while let Some(row) = rows.next()? {
            drivers.push(parse_driver_row(row)?);
        }
        Ok(drivers)
    }

    fn attach_drivers(&self, cars: Vec<Car>) -> RepoResult<Vec<Car>> {
        cars.into_iter()
            .map(|mut car| {
                car.drivers = self.load_drivers(car.id)?;
                Ok(car)
            })
            .collect()
    }

    fn exists(&self, table: &str, id: i64) -> RepoResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1;"), [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}

impl CarRepository for SqliteCarRepository<'_> {
    fn create_car(&self, draft: &CarDraft) -> RepoResult<CarId> {
        draft.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO cars (model, manufacturer_id) VALUES (?1, ?2);",
            params![draft.model.trim(), draft.manufacturer_id],
        )
        .map_err(|err| map_write_error(ENTITY, err))?;
        let car_id = tx.last_insert_rowid();
        Self::insert_memberships(&tx, car_id, draft)?;
        tx.commit()?;

        Ok(car_id)
    }

    fn update_car(&self, id: CarId, draft: &CarDraft) -> RepoResult<()> {
        draft.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(
                "UPDATE cars SET model = ?1, manufacturer_id = ?2 WHERE id = ?3;",
                params![draft.model.trim(), draft.manufacturer_id, id],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        tx.execute("DELETE FROM car_drivers WHERE car_id = ?1;", [id])?;
        Self::insert_memberships(&tx, id, draft)?;
        tx.commit()?;

        Ok(())
    }

    fn get_car(&self, id: CarId) -> RepoResult<Option<Car>> {
        let car = self
            .conn
            .query_row(
                &format!("{CAR_SELECT_SQL} WHERE cars.id = ?1;"),
                [id],
                parse_car_row,
            )
            .optional()?;
        match car {
            Some(mut car) => {
                car.drivers = self.load_drivers(car.id)?;
                Ok(Some(car))
            }
            None => Ok(None),
        }
    }

    fn list_cars(&self, query: &CarListQuery) -> RepoResult<Page<Car>> {
        let mut where_sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(model) = query.model.as_ref() {
            where_sql.push_str(" AND ");
            where_sql.push_str(&TextFilter::sql_predicate("cars.model"));
            bind_values.push(Value::Text(model.like_pattern()));
        }
        if let Some(manufacturer_id) = query.manufacturer_id {
            where_sql.push_str(" AND cars.manufacturer_id = ?");
            bind_values.push(Value::Integer(manufacturer_id));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM cars{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let total = count_to_u64(total)?;
        let (limit, offset) = query.page.window(total)?;

        let sql = format!("{CAR_SELECT_SQL}{where_sql} ORDER BY cars.id ASC LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let cars = stmt
            .query_map(params_from_iter(bind_values), parse_car_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items: self.attach_drivers(cars)?,
            total,
            number: query.page.number,
            size: query.page.size,
        })
    }

    fn delete_car(&self, id: CarId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM cars WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn count_cars(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cars;", [], |row| row.get(0))?;
        count_to_u64(total)
    }

    fn toggle_driver(&self, car_id: CarId, driver_id: DriverId) -> RepoResult<bool> {
        if !self.exists("cars", car_id)? {
            return Err(RepoError::NotFound {
                entity: ENTITY,
                id: car_id,
            });
        }
        if !self.exists("drivers", driver_id)? {
            return Err(RepoError::NotFound {
                entity: "driver",
                id: driver_id,
            });
        }

        let removed = self.conn.execute(
            "DELETE FROM car_drivers WHERE car_id = ?1 AND driver_id = ?2;",
            params![car_id, driver_id],
        )?;
        if removed > 0 {
            return Ok(false);
        }

        self.conn
            .execute(
                "INSERT INTO car_drivers (car_id, driver_id) VALUES (?1, ?2);",
                params![car_id, driver_id],
            )
            .map_err(|err| map_write_error(ENTITY, err))?;
        Ok(true)
    }

    fn cars_for_driver(&self, driver_id: DriverId) -> RepoResult<Vec<Car>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CAR_SELECT_SQL}
             JOIN car_drivers ON car_drivers.car_id = cars.id
             WHERE car_drivers.driver_id = ?1
             ORDER BY cars.id ASC;"
        ))?;
        let cars = stmt
            .query_map([driver_id], parse_car_row)?
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_drivers(cars)
    }
}

/// Parses a row selected with `CAR_SELECT_SQL`; drivers are attached separately.
fn parse_car_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get("car_id")?,
        model: row.get("car_model")?,
        manufacturer: Manufacturer {
            id: row.get("manufacturer_id")?,
            name: row.get("manufacturer_name")?,
            country: row.get("manufacturer_country")?,
        },
        drivers: Vec::new(),
    })
}
