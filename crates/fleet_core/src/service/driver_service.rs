//! Driver use-case service.
//!
//! # Responsibility
//! - Create driver accounts with hashed passwords.
//! - Update license numbers and assemble the driver detail view.
//!
//! # Invariants
//! - Plain-text passwords never leave this module unhashed.
//! - Username and license number conflicts are reported on their fields.

use crate::auth::hash_password;
use crate::forms::{DriverCreationForm, DriverLicenseUpdateForm, FormErrors};
use crate::model::car::Car;
use crate::model::driver::{Driver, DriverDraft, DriverId};
use crate::repo::car_repo::{CarRepository, SqliteCarRepository};
use crate::repo::driver_repo::{DriverListQuery, DriverRepository, SqliteDriverRepository};
use crate::search::page::Page;
use crate::service::{conflict_to_form, require_found, ServiceResult};
use log::info;
use rusqlite::Connection;
use serde::Serialize;

const ENTITY: &str = "driver";

const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
const MSG_LICENSE_TAKEN: &str = "Driver with this License number already exists.";

/// Driver detail page model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverDetail {
    pub driver: Driver,
    pub cars: Vec<Car>,
}

/// Driver service facade over driver and car repositories.
pub struct DriverService<D: DriverRepository, C: CarRepository> {
    drivers: D,
    cars: C,
}

impl<'conn> DriverService<SqliteDriverRepository<'conn>, SqliteCarRepository<'conn>> {
    /// Builds the service over a migrated SQLite connection.
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(
            SqliteDriverRepository::try_new(conn)?,
            SqliteCarRepository::try_new(conn)?,
        ))
    }
}

impl<D: DriverRepository, C: CarRepository> DriverService<D, C> {
    pub fn new(drivers: D, cars: C) -> Self {
        Self { drivers, cars }
    }

    pub fn list(&self, query: &DriverListQuery) -> ServiceResult<Page<Driver>> {
        Ok(self.drivers.list_drivers(query)?)
    }

    pub fn get(&self, id: DriverId) -> ServiceResult<Driver> {
        require_found(self.drivers.get_driver(id)?, ENTITY, id)
    }

    pub fn detail(&self, id: DriverId) -> ServiceResult<DriverDetail> {
        let driver = self.get(id)?;
        let cars = self.cars.cars_for_driver(id)?;
        Ok(DriverDetail { driver, cars })
    }

    pub fn create(&self, form: &DriverCreationForm) -> ServiceResult<DriverId> {
        let draft = form.validate()?;
        self.reject_taken(&draft.username, draft.license_number.as_deref())?;
        let password_hash = hash_password(&form.password1)?;
        let id = self
            .drivers
            .create_driver(&draft, &password_hash)
            .map_err(|err| conflict_to_form(err, driver_conflict))?;
        info!("event=driver_create module=service status=ok id={id}");
        Ok(id)
    }

    /// Creates a staff superuser account, bypassing form password rules.
    pub fn create_superuser(
        &self,
        username: &str,
        password: &str,
        license_number: Option<&str>,
    ) -> ServiceResult<DriverId> {
        let mut draft = DriverDraft::new(
            username.trim(),
            license_number.map(|value| value.trim().to_string()),
        );
        draft.is_staff = true;
        draft.is_superuser = true;
        draft.validate()?;
        self.reject_taken(&draft.username, draft.license_number.as_deref())?;

        let password_hash = hash_password(password)?;
        let id = self
            .drivers
            .create_driver(&draft, &password_hash)
            .map_err(|err| conflict_to_form(err, driver_conflict))?;
        info!("event=driver_create_superuser module=service status=ok id={id}");
        Ok(id)
    }

    pub fn update_license(&self, id: DriverId, form: &DriverLicenseUpdateForm) -> ServiceResult<()> {
        self.get(id)?;
        let license_number = form.validate()?;
        if self.drivers.license_number_taken(&license_number, Some(id))? {
            let mut errors = FormErrors::new();
            errors.add("license_number", MSG_LICENSE_TAKEN);
            return Err(errors.into());
        }
        self.drivers
            .update_license_number(id, Some(&license_number))
            .map_err(|err| conflict_to_form(err, driver_conflict))?;
        info!("event=driver_update_license module=service status=ok id={id}");
        Ok(())
    }

    /// Reports every already-used unique field at once.
    ///
    /// The insert still maps constraint failures, for writes racing this check.
    fn reject_taken(&self, username: &str, license_number: Option<&str>) -> ServiceResult<()> {
        let mut errors = FormErrors::new();
        if self.drivers.username_taken(username, None)? {
            errors.add("username", MSG_USERNAME_TAKEN);
        }
        if let Some(license_number) = license_number {
            if self.drivers.license_number_taken(license_number, None)? {
                errors.add("license_number", MSG_LICENSE_TAKEN);
            }
        }
        Ok(errors.finish(())?)
    }

    pub fn delete(&self, id: DriverId) -> ServiceResult<()> {
        self.drivers.delete_driver(id)?;
        info!("event=driver_delete module=service status=ok id={id}");
        Ok(())
    }
}

fn driver_conflict(field: &str) -> Option<(&'static str, String)> {
    match field {
        "username" => Some(("username", MSG_USERNAME_TAKEN.to_string())),
        "license_number" => Some(("license_number", MSG_LICENSE_TAKEN.to_string())),
        _ => None,
    }
}
