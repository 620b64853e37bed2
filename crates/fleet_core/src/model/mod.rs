//! Fleet domain model: manufacturers, cars and drivers.
//!
//! # Responsibility
//! - Define canonical records used by repositories, services and pages.
//! - Own field-level validation rules shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a storage-assigned integer id.
//! - Drafts are validated before any SQL mutation.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod car;
pub mod driver;
pub mod manufacturer;

/// Maximum length of free-text name fields.
pub const NAME_MAX_CHARS: usize = 255;

/// Field-level validation failure for a draft record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is blank after trimming.
    Required { field: &'static str },
    /// Field exceeds its maximum character count.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Username contains characters outside `[A-Za-z0-9@.+-_]`.
    InvalidUsername,
    /// License number breaks the `AAA00000` format.
    InvalidLicenseNumber(driver::LicenseNumberError),
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field } | Self::TooLong { field, .. } => field,
            Self::InvalidUsername => "username",
            Self::InvalidLicenseNumber(_) => "license_number",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required { .. } => write!(f, "This field is required."),
            Self::TooLong {
                max_chars,
                actual_chars,
                ..
            } => write!(
                f,
                "Ensure this value has at most {max_chars} characters (it has {actual_chars})."
            ),
            Self::InvalidUsername => write!(
                f,
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
            ),
            Self::InvalidLicenseNumber(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank values for required fields.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Rejects values longer than `max_chars` characters.
pub(crate) fn limit_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}
