//! HTTP error mapping.
//!
//! # Invariants
//! - Every error response carries `{"error": {"code", "message"}}`.
//! - Internal details are logged, not sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleet_core::{FormErrors, PageError, RepoError, ServiceError, SessionError};
use log::error;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Internal(_) => write!(f, "internal server error"),
        }
    }
}

impl Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(details) = &self {
            error!("event=http_error module=web status=error error={details}");
        }
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            ServiceError::Page(err) => Self::from(err),
            ServiceError::Form(errors) => Self::BadRequest(errors.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        Self::from(ServiceError::from(value))
    }
}

impl From<PageError> for AppError {
    fn from(value: PageError) -> Self {
        Self::NotFound(value.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Internal(value.to_string())
    }
}

/// Separates re-renderable form errors from failures that end the request.
pub fn split_form<T>(result: Result<T, ServiceError>) -> Result<Result<T, FormErrors>, ServiceError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(ServiceError::Form(errors)) => Ok(Err(errors)),
        Err(other) => Err(other),
    }
}
