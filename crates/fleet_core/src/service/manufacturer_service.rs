//! Manufacturer use-case service.
//!
//! # Invariants
//! - Duplicate names are reported on the `name` field, never as storage errors.

use crate::forms::ManufacturerForm;
use crate::model::manufacturer::{Manufacturer, ManufacturerId};
use crate::repo::manufacturer_repo::{
    ManufacturerListQuery, ManufacturerRepository, SqliteManufacturerRepository,
};
use crate::search::page::Page;
use crate::service::{conflict_to_form, require_found, ServiceResult};
use log::info;
use rusqlite::Connection;

const ENTITY: &str = "manufacturer";

/// Manufacturer service facade over repository implementations.
pub struct ManufacturerService<R: ManufacturerRepository> {
    repo: R,
}

impl<'conn> ManufacturerService<SqliteManufacturerRepository<'conn>> {
    /// Builds the service over a migrated SQLite connection.
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(SqliteManufacturerRepository::try_new(conn)?))
    }
}

impl<R: ManufacturerRepository> ManufacturerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, query: &ManufacturerListQuery) -> ServiceResult<Page<Manufacturer>> {
        Ok(self.repo.list_manufacturers(query)?)
    }

    pub fn get(&self, id: ManufacturerId) -> ServiceResult<Manufacturer> {
        require_found(self.repo.get_manufacturer(id)?, ENTITY, id)
    }

    pub fn create(&self, form: &ManufacturerForm) -> ServiceResult<ManufacturerId> {
        let draft = form.validate()?;
        let id = self
            .repo
            .create_manufacturer(&draft)
            .map_err(|err| conflict_to_form(err, name_conflict))?;
        info!("event=manufacturer_create module=service status=ok id={id}");
        Ok(id)
    }

    pub fn update(&self, id: ManufacturerId, form: &ManufacturerForm) -> ServiceResult<()> {
        self.get(id)?;
        let draft = form.validate()?;
        self.repo
            .update_manufacturer(id, &draft)
            .map_err(|err| conflict_to_form(err, name_conflict))?;
        info!("event=manufacturer_update module=service status=ok id={id}");
        Ok(())
    }

    /// Deletes the manufacturer together with its cars.
    pub fn delete(&self, id: ManufacturerId) -> ServiceResult<()> {
        self.repo.delete_manufacturer(id)?;
        info!("event=manufacturer_delete module=service status=ok id={id}");
        Ok(())
    }
}

fn name_conflict(field: &str) -> Option<(&'static str, String)> {
    (field == "name").then(|| {
        (
            "name",
            "Manufacturer with this Name already exists.".to_string(),
        )
    })
}
