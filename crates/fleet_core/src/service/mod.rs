//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate storage failures into form errors the pages can show.
//! - Keep the HTTP layer decoupled from storage details.

use crate::auth::AuthError;
use crate::forms::FormErrors;
use crate::model::ValidationError;
use crate::repo::RepoError;
use crate::search::page::PageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod auth_service;
pub mod car_service;
pub mod dashboard_service;
pub mod driver_service;
pub mod manufacturer_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by all use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Submitted form is invalid; messages are keyed by field.
    Form(FormErrors),
    NotFound { entity: &'static str, id: i64 },
    /// Requested list page does not exist.
    Page(PageError),
    Auth(AuthError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form(errors) => write!(f, "invalid form: {errors}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Page(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Form(errors) => Some(errors),
            Self::Page(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Page(err) => Self::Page(err),
            RepoError::Validation(err) => Self::Form(FormErrors::from(err)),
            other => Self::Repo(other),
        }
    }
}

impl From<FormErrors> for ServiceError {
    fn from(value: FormErrors) -> Self {
        Self::Form(value)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Form(FormErrors::from(value))
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

/// Turns a unique-constraint conflict into a field error using `message_for`.
///
/// `message_for` receives the conflicting column and returns `(field, message)`.
pub(crate) fn conflict_to_form(
    err: RepoError,
    message_for: impl Fn(&str) -> Option<(&'static str, String)>,
) -> ServiceError {
    if let RepoError::Conflict { field, .. } = &err {
        if let Some((form_field, message)) = message_for(field) {
            let mut errors = FormErrors::new();
            errors.add(form_field, message);
            return ServiceError::Form(errors);
        }
    }
    ServiceError::from(err)
}

/// Maps a missing row to `ServiceError::NotFound`.
pub(crate) fn require_found<T>(found: Option<T>, entity: &'static str, id: i64) -> ServiceResult<T> {
    found.ok_or(ServiceError::NotFound { entity, id })
}
