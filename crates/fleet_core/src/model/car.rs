//! Car domain model.
//!
//! # Invariants
//! - A car always references exactly one existing manufacturer.
//! - Driver membership is a set: no duplicates, no cardinality limit.

use super::driver::{Driver, DriverId};
use super::manufacturer::{Manufacturer, ManufacturerId};
use super::{limit_chars, require, ValidationError, NAME_MAX_CHARS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Storage-assigned car identifier.
pub type CarId = i64;

/// Read model for car list/detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub model: String,
    pub manufacturer: Manufacturer,
    /// Assigned drivers ordered by id.
    pub drivers: Vec<Driver>,
}

impl Car {
    /// Returns whether `driver_id` is assigned to this car.
    pub fn has_driver(&self, driver_id: DriverId) -> bool {
        self.drivers.iter().any(|driver| driver.id == driver_id)
    }
}

impl Display for Car {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.model)
    }
}

/// Writable car fields, including the full driver set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarDraft {
    pub model: String,
    pub manufacturer_id: ManufacturerId,
    pub driver_ids: BTreeSet<DriverId>,
}

impl CarDraft {
    pub fn new(
        model: impl Into<String>,
        manufacturer_id: ManufacturerId,
        driver_ids: impl IntoIterator<Item = DriverId>,
    ) -> Self {
        Self {
            model: model.into(),
            manufacturer_id,
            driver_ids: driver_ids.into_iter().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("model", &self.model)?;
        limit_chars("model", &self.model, NAME_MAX_CHARS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Car, CarDraft};
    use crate::model::manufacturer::Manufacturer;

    #[test]
    fn display_is_model_name() {
        let car = Car {
            id: 1,
            model: "test_model".to_string(),
            manufacturer: Manufacturer {
                id: 1,
                name: "test_name".to_string(),
                country: "test_country".to_string(),
            },
            drivers: Vec::new(),
        };
        assert_eq!(car.to_string(), "test_model");
        assert!(!car.has_driver(1));
    }

    #[test]
    fn draft_deduplicates_driver_ids() {
        let draft = CarDraft::new("Model T", 1, [3, 1, 3]);
        assert_eq!(draft.driver_ids.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }
}
