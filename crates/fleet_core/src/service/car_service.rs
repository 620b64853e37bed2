//! Car use-case service.
//!
//! # Responsibility
//! - Validate car forms against existing manufacturers and drivers.
//! - Toggle the current driver's assignment to a car.
//!
//! # Invariants
//! - A saved car references exactly the manufacturer and driver set submitted.
//! - Unknown ids are reported as invalid choices on the offending field.

use crate::forms::{invalid_multi_choice, CarForm, FormErrors, MSG_INVALID_CHOICE};
use crate::model::car::{Car, CarDraft, CarId};
use crate::model::driver::{Driver, DriverId};
use crate::model::manufacturer::Manufacturer;
use crate::repo::car_repo::{CarListQuery, CarRepository, SqliteCarRepository};
use crate::repo::driver_repo::{DriverRepository, SqliteDriverRepository};
use crate::repo::manufacturer_repo::{ManufacturerRepository, SqliteManufacturerRepository};
use crate::repo::RepoError;
use crate::search::page::Page;
use crate::service::{require_found, ServiceError, ServiceResult};
use log::info;
use rusqlite::Connection;
use serde::Serialize;

const ENTITY: &str = "car";

/// Options offered by the car form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarFormChoices {
    pub manufacturers: Vec<Manufacturer>,
    pub drivers: Vec<Driver>,
}

/// Car service facade over car, manufacturer and driver repositories.
pub struct CarService<C, M, D>
where
    C: CarRepository,
    M: ManufacturerRepository,
    D: DriverRepository,
{
    cars: C,
    manufacturers: M,
    drivers: D,
}

impl<'conn>
    CarService<
        SqliteCarRepository<'conn>,
        SqliteManufacturerRepository<'conn>,
        SqliteDriverRepository<'conn>,
    >
{
    /// Builds the service over a migrated SQLite connection.
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(
            SqliteCarRepository::try_new(conn)?,
            SqliteManufacturerRepository::try_new(conn)?,
            SqliteDriverRepository::try_new(conn)?,
        ))
    }
}

impl<C, M, D> CarService<C, M, D>
where
    C: CarRepository,
    M: ManufacturerRepository,
    D: DriverRepository,
{
    pub fn new(cars: C, manufacturers: M, drivers: D) -> Self {
        Self {
            cars,
            manufacturers,
            drivers,
        }
    }

    pub fn list(&self, query: &CarListQuery) -> ServiceResult<Page<Car>> {
        Ok(self.cars.list_cars(query)?)
    }

    pub fn get(&self, id: CarId) -> ServiceResult<Car> {
        require_found(self.cars.get_car(id)?, ENTITY, id)
    }

    pub fn form_choices(&self) -> ServiceResult<CarFormChoices> {
        Ok(CarFormChoices {
            manufacturers: self.manufacturers.all_manufacturers()?,
            drivers: self.drivers.all_drivers()?,
        })
    }

    pub fn create(&self, form: &CarForm) -> ServiceResult<CarId> {
        let draft = self.clean(form)?;
        let id = self
            .cars
            .create_car(&draft)
            .map_err(reference_to_form)?;
        info!(
            "event=car_create module=service status=ok id={id} drivers={}",
            draft.driver_ids.len()
        );
        Ok(id)
    }

    pub fn update(&self, id: CarId, form: &CarForm) -> ServiceResult<()> {
        self.get(id)?;
        let draft = self.clean(form)?;
        self.cars
            .update_car(id, &draft)
            .map_err(reference_to_form)?;
        info!("event=car_update module=service status=ok id={id}");
        Ok(())
    }

    pub fn delete(&self, id: CarId) -> ServiceResult<()> {
        self.cars.delete_car(id)?;
        info!("event=car_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Flips `driver_id` membership on the car; returns `true` when now assigned.
    pub fn toggle_assignment(&self, car_id: CarId, driver_id: DriverId) -> ServiceResult<bool> {
        let assigned = self.cars.toggle_driver(car_id, driver_id)?;
        info!(
            "event=car_toggle_assign module=service status=ok car_id={car_id} driver_id={driver_id} assigned={assigned}"
        );
        Ok(assigned)
    }

    /// Runs form validation plus existence checks on referenced ids.
    fn clean(&self, form: &CarForm) -> ServiceResult<CarDraft> {
        let draft = form.validate()?;

        let mut errors = FormErrors::new();
        if self
            .manufacturers
            .get_manufacturer(draft.manufacturer_id)?
            .is_none()
        {
            errors.add("manufacturer", MSG_INVALID_CHOICE);
        }
        for driver_id in &draft.driver_ids {
            if self.drivers.get_driver(*driver_id)?.is_none() {
                errors.add("drivers", invalid_multi_choice(&driver_id.to_string()));
            }
        }
        Ok(errors.finish(draft)?)
    }
}

/// A row vanished between the existence check and the write.
fn reference_to_form(err: RepoError) -> ServiceError {
    match err {
        RepoError::InvalidReference(_) => {
            let mut errors = FormErrors::new();
            errors.add_non_field(MSG_INVALID_CHOICE);
            ServiceError::Form(errors)
        }
        other => ServiceError::from(other),
    }
}
