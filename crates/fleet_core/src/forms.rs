//! Submitted form parsing and field validation.
//!
//! # Responsibility
//! - Turn urlencoded pairs into typed forms and drafts.
//! - Collect every field-level message instead of stopping at the first.
//!
//! # Invariants
//! - Password fields are never echoed back in serialized forms.
//! - Non-field messages are stored under [`NON_FIELD_ERRORS`].

use crate::model::car::CarDraft;
use crate::model::driver::{
    validate_license_number, validate_username, DriverDraft, DriverId, USERNAME_MAX_CHARS,
};
use crate::model::manufacturer::{ManufacturerDraft, ManufacturerId};
use crate::model::{limit_chars, require, ValidationError, NAME_MAX_CHARS};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error key for messages not tied to one field.
pub const NON_FIELD_ERRORS: &str = "__all__";
/// Minimum password length accepted on account creation.
pub const PASSWORD_MIN_CHARS: usize = 8;

pub const MSG_INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const MSG_INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Field name to messages, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    /// Records a failed check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.add(err.field(), err.to_string());
        }
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when no message was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Error for FormErrors {}

impl From<ValidationError> for FormErrors {
    fn from(value: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.check(Err(value));
        errors
    }
}

/// Decoded urlencoded body or query string; keeps repeated keys.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value for `name`, or an empty string.
    pub fn value(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Every value submitted for `name`, in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

/// Search box state shown on list pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchForm {
    pub field: &'static str,
    pub placeholder: &'static str,
    pub value: String,
}

impl SearchForm {
    pub fn manufacturers(value: Option<&str>) -> Self {
        Self::build("name", "Search by name", value)
    }

    pub fn cars(value: Option<&str>) -> Self {
        Self::build("model", "Search by model", value)
    }

    pub fn drivers(value: Option<&str>) -> Self {
        Self::build("username", "Search by username", value)
    }

    fn build(field: &'static str, placeholder: &'static str, value: Option<&str>) -> Self {
        Self {
            field,
            placeholder,
            value: value.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManufacturerForm {
    pub name: String,
    pub country: String,
}

impl ManufacturerForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.value("name"),
            country: data.value("country"),
        }
    }

    pub fn validate(&self) -> Result<ManufacturerDraft, FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(require("name", &self.name).and_then(|()| {
            limit_chars("name", self.name.trim(), NAME_MAX_CHARS)
        }));
        errors.check(limit_chars("country", self.country.trim(), NAME_MAX_CHARS));
        errors.finish(ManufacturerDraft::new(
            self.name.trim(),
            self.country.trim(),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CarForm {
    pub model: String,
    pub manufacturer: String,
    pub drivers: Vec<String>,
}

impl CarForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            model: data.value("model"),
            manufacturer: data.value("manufacturer"),
            drivers: data
                .get_all("drivers")
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Checks shape only; the service checks that referenced ids exist.
    pub fn validate(&self) -> Result<CarDraft, FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(
            require("model", &self.model)
                .and_then(|()| limit_chars("model", self.model.trim(), NAME_MAX_CHARS)),
        );

        let manufacturer_id = if self.manufacturer.trim().is_empty() {
            errors.check(Err(ValidationError::Required {
                field: "manufacturer",
            }));
            None
        } else {
            match self.manufacturer.trim().parse::<ManufacturerId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("manufacturer", MSG_INVALID_CHOICE);
                    None
                }
            }
        };

        let mut driver_ids = Vec::with_capacity(self.drivers.len());
        for raw in &self.drivers {
            match raw.trim().parse::<DriverId>() {
                Ok(id) => driver_ids.push(id),
                Err(_) => errors.add("drivers", invalid_multi_choice(raw)),
            }
        }

        match manufacturer_id {
            Some(manufacturer_id) if errors.is_empty() => Ok(CarDraft::new(
                self.model.trim(),
                manufacturer_id,
                driver_ids,
            )),
            _ => Err(errors),
        }
    }
}

/// Message for a multi-select value that names no existing row.
pub fn invalid_multi_choice(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverCreationForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
    pub license_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl DriverCreationForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.value("username"),
            password1: data.value("password1"),
            password2: data.value("password2"),
            license_number: data.value("license_number"),
            first_name: data.value("first_name"),
            last_name: data.value("last_name"),
            email: data.value("email"),
        }
    }

    pub fn validate(&self) -> Result<DriverDraft, FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_username(self.username.trim()));
        errors.check(limit_chars("first_name", self.first_name.trim(), USERNAME_MAX_CHARS));
        errors.check(limit_chars("last_name", self.last_name.trim(), USERNAME_MAX_CHARS));
        errors.check(limit_chars("email", self.email.trim(), NAME_MAX_CHARS));
        errors.check(check_license_number(&self.license_number));

        if self.password1.is_empty() {
            errors.check(Err(ValidationError::Required { field: "password1" }));
        }
        if self.password2.is_empty() {
            errors.check(Err(ValidationError::Required { field: "password2" }));
        } else if !self.password1.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", MSG_PASSWORD_MISMATCH);
            } else {
                for message in password_strength_messages(&self.password2) {
                    errors.add("password2", message);
                }
            }
        }

        errors.finish(DriverDraft {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            license_number: Some(self.license_number.trim().to_string()),
            is_staff: false,
            is_superuser: false,
        })
    }
}

/// Strength rules applied to a new password.
pub fn password_strength_messages(password: &str) -> Vec<String> {
    let mut messages = Vec::new();
    if password.chars().count() < PASSWORD_MIN_CHARS {
        messages.push(format!(
            "This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."
        ));
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        messages.push("This password is entirely numeric.".to_string());
    }
    messages
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverLicenseUpdateForm {
    pub license_number: String,
}

impl DriverLicenseUpdateForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            license_number: data.value("license_number"),
        }
    }

    /// Returns the trimmed license number.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(check_license_number(&self.license_number));
        errors.finish(self.license_number.trim().to_string())
    }
}

fn check_license_number(raw: &str) -> Result<(), ValidationError> {
    let value = raw.trim();
    require("license_number", value)?;
    validate_license_number(value).map_err(ValidationError::InvalidLicenseNumber)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.value("username"),
            password: data.value("password"),
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(require("username", &self.username));
        if self.password.is_empty() {
            errors.check(Err(ValidationError::Required { field: "password" }));
        }
        errors.finish(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CarForm, DriverCreationForm, DriverLicenseUpdateForm, FormData, FormErrors,
        ManufacturerForm, MSG_INVALID_CHOICE, MSG_PASSWORD_MISMATCH,
    };

    fn data(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn form_data_keeps_repeated_keys() {
        let form = data(&[("drivers", "1"), ("model", "X"), ("drivers", "3")]);
        assert_eq!(form.get_all("drivers"), vec!["1", "3"]);
        assert_eq!(form.get("model"), Some("X"));
        assert_eq!(form.get("missing"), None);
    }

    #[test]
    fn manufacturer_form_requires_name() {
        let errors = ManufacturerForm::from_data(&data(&[("country", "DE")]))
            .validate()
            .expect_err("blank name must fail");
        assert_eq!(errors.get("name"), ["This field is required."]);
    }

    #[test]
    fn car_form_parses_membership() {
        let draft = CarForm::from_data(&data(&[
            ("model", " test_model "),
            ("manufacturer", "1"),
            ("drivers", "2"),
            ("drivers", "1"),
        ]))
        .validate()
        .expect("valid car form");
        assert_eq!(draft.model, "test_model");
        assert_eq!(draft.manufacturer_id, 1);
        assert_eq!(draft.driver_ids.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn car_form_reports_every_bad_field() {
        let errors = CarForm::from_data(&data(&[("manufacturer", "abc"), ("drivers", "x")]))
            .validate()
            .expect_err("invalid car form");
        assert_eq!(errors.get("model"), ["This field is required."]);
        assert_eq!(errors.get("manufacturer"), [MSG_INVALID_CHOICE]);
        assert_eq!(errors.get("drivers").len(), 1);
    }

    #[test]
    fn driver_creation_checks_passwords() {
        let mismatch = DriverCreationForm::from_data(&data(&[
            ("username", "new_user"),
            ("password1", "user12test"),
            ("password2", "user12tesX"),
            ("license_number", "TES12345"),
        ]))
        .validate()
        .expect_err("mismatch must fail");
        assert_eq!(mismatch.get("password2"), [MSG_PASSWORD_MISMATCH]);

        let weak = DriverCreationForm::from_data(&data(&[
            ("username", "new_user"),
            ("password1", "1234"),
            ("password2", "1234"),
            ("license_number", "TES12345"),
        ]))
        .validate()
        .expect_err("weak password must fail");
        assert_eq!(weak.get("password2").len(), 2);
    }

    #[test]
    fn driver_creation_builds_draft() {
        let draft = DriverCreationForm::from_data(&data(&[
            ("username", "new_user"),
            ("password1", "user12test"),
            ("password2", "user12test"),
            ("first_name", "Test first"),
            ("last_name", "Test last"),
            ("license_number", "TES12345"),
        ]))
        .validate()
        .expect("valid driver form");
        assert_eq!(draft.username, "new_user");
        assert_eq!(draft.license_number.as_deref(), Some("TES12345"));
        assert!(!draft.is_staff);
    }

    #[test]
    fn license_form_reports_first_broken_rule_only() {
        let cases = [
            ("TES1234", "License number should consist of 8 characters"),
            ("tes12345", "First 3 characters should be uppercase letters"),
            ("TES1234A", "Last 5 characters should be digits"),
            ("", "This field is required."),
        ];
        for (value, expected) in cases {
            let errors = DriverLicenseUpdateForm::from_data(&data(&[("license_number", value)]))
                .validate()
                .expect_err("invalid license must fail");
            assert_eq!(errors.get("license_number"), [expected], "value `{value}`");
        }
    }

    #[test]
    fn passwords_are_not_serialized() {
        let form = DriverCreationForm {
            username: "u".to_string(),
            password1: "secret-value".to_string(),
            ..DriverCreationForm::default()
        };
        let json = serde_json::to_string(&form).expect("serialize");
        assert!(!json.contains("secret-value"));
        assert_eq!(
            serde_json::to_value(FormErrors::new()).expect("serialize"),
            serde_json::json!({})
        );
    }
}
