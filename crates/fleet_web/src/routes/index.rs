//! Home page.

use crate::app_state::AppState;
use crate::auth::CurrentDriver;
use crate::error::AppResult;
use crate::page::render;
use crate::session::SessionHandle;
use axum::extract::State;
use axum::response::Response;
use fleet_core::service::dashboard_service::{dashboard_counts, record_home_visit};
use serde_json::json;

pub async fn index(
    State(state): State<AppState>,
    CurrentDriver(user): CurrentDriver,
    session: SessionHandle,
) -> AppResult<Response> {
    let num_visits = record_home_visit(&mut *session.lock()?);
    let counts = state.db.with(dashboard_counts)?;

    Ok(render(
        "index",
        json!({
            "num_manufacturers": counts.num_manufacturers,
            "num_cars": counts.num_cars,
            "num_drivers": counts.num_drivers,
            "num_visits": num_visits,
            "user": {
                "id": user.id,
                "username": user.username,
            },
        }),
    ))
}
