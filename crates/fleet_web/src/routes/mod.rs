//! Route table.

use crate::app_state::AppState;
use crate::middleware::log_requests;
use crate::session::session_middleware;
use axum::routing::get;
use axum::Router;

pub mod accounts;
pub mod cars;
pub mod drivers;
pub mod index;
pub mod manufacturers;

/// Builds the full router with session and logging middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .merge(accounts::router())
        .merge(manufacturers::router())
        .merge(cars::router())
        .merge(drivers::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(state)
}

/// Parses an optional exact-match id filter; blank means no filter.
pub(crate) fn parse_id_filter(name: &str, raw: Option<&str>) -> Result<Option<i64>, crate::error::AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            crate::error::AppError::BadRequest(format!("`{name}` must be an integer, got `{value}`"))
        }),
    }
}
