//! Manufacturer domain model.

use super::{limit_chars, require, ValidationError, NAME_MAX_CHARS};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage-assigned manufacturer identifier.
pub type ManufacturerId = i64;

/// Car manufacturer, listed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    /// Unique display name.
    pub name: String,
    /// Country of origin; may be empty.
    pub country: String,
}

impl Display for Manufacturer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

/// Writable manufacturer fields for create/update paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturerDraft {
    pub name: String,
    pub country: String,
}

impl ManufacturerDraft {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }

    /// Validates draft fields before persistence.
    ///
    /// # Errors
    /// - `Required` when `name` is blank.
    /// - `TooLong` when `name` or `country` exceed 255 characters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        limit_chars("name", &self.name, NAME_MAX_CHARS)?;
        limit_chars("country", &self.country, NAME_MAX_CHARS)?;
        Ok(())
    }
}
