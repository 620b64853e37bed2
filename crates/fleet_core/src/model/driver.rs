//! Driver (account) domain model.
//!
//! # Invariants
//! - `username` is unique and limited to `[A-Za-z0-9@.+-_]`, at most 150 chars.
//! - `license_number`, when present, is unique and matches `AAA00000`.
//! - Password hashes never leave the repository layer inside `Driver`.

use super::{limit_chars, require, ValidationError, NAME_MAX_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned driver identifier.
pub type DriverId = i64;

pub const USERNAME_MAX_CHARS: usize = 150;
pub const LICENSE_NUMBER_LEN: usize = 8;
const LICENSE_PREFIX_LEN: usize = 3;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@.+\-_]+$").expect("valid username regex"));
static LICENSE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid license prefix regex"));
static LICENSE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("valid license suffix regex"));

/// Authenticated staff member who can be assigned to cars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Unix epoch milliseconds.
    pub date_joined: i64,
}

impl Driver {
    /// Canonical detail page path for this driver.
    pub fn absolute_url(&self) -> String {
        format!("/drivers/{}/", self.id)
    }

    /// `first last`, trimmed when either part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Display for Driver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.username, self.first_name, self.last_name
        )
    }
}

/// Writable driver fields for account creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverDraft {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl DriverDraft {
    /// Creates a regular (non-staff) driver draft.
    pub fn new(username: impl Into<String>, license_number: Option<String>) -> Self {
        Self {
            username: username.into(),
            license_number,
            ..Self::default()
        }
    }

    /// Validates draft fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        limit_chars("first_name", &self.first_name, USERNAME_MAX_CHARS)?;
        limit_chars("last_name", &self.last_name, USERNAME_MAX_CHARS)?;
        limit_chars("email", &self.email, NAME_MAX_CHARS)?;
        if let Some(license_number) = self.license_number.as_deref() {
            validate_license_number(license_number)
                .map_err(ValidationError::InvalidLicenseNumber)?;
        }
        Ok(())
    }
}

/// Checks username presence, length and allowed characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    require("username", username)?;
    limit_chars("username", username, USERNAME_MAX_CHARS)?;
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(())
}

/// License number format violation. Only the first broken rule is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseNumberError {
    WrongLength,
    PrefixNotUppercase,
    SuffixNotDigits,
}

impl Display for LicenseNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongLength => write!(
                f,
                "License number should consist of {LICENSE_NUMBER_LEN} characters"
            ),
            Self::PrefixNotUppercase => {
                write!(f, "First 3 characters should be uppercase letters")
            }
            Self::SuffixNotDigits => write!(f, "Last 5 characters should be digits"),
        }
    }
}

impl Error for LicenseNumberError {}

/// Validates the `AAA00000` license number format.
pub fn validate_license_number(value: &str) -> Result<(), LicenseNumberError> {
    if value.chars().count() != LICENSE_NUMBER_LEN {
        return Err(LicenseNumberError::WrongLength);
    }

    let split_at = value
        .char_indices()
        .nth(LICENSE_PREFIX_LEN)
        .map_or(value.len(), |(idx, _)| idx);
    let (prefix, suffix) = value.split_at(split_at);

    if !LICENSE_PREFIX_RE.is_match(prefix) {
        return Err(LicenseNumberError::PrefixNotUppercase);
    }
    if !LICENSE_SUFFIX_RE.is_match(suffix) {
        return Err(LicenseNumberError::SuffixNotDigits);
    }
    Ok(())
}
