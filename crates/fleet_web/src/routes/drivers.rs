//! Driver pages.

use crate::app_state::AppState;
use crate::auth::CurrentDriver;
use crate::error::{split_form, AppResult};
use crate::page::{found, list_context, render};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use fleet_core::forms::{DriverCreationForm, DriverLicenseUpdateForm};
use fleet_core::repo::driver_repo::DriverListQuery;
use fleet_core::service::driver_service::DriverService;
use fleet_core::{Driver, DriverId, FormData, FormErrors, PageRequest, SearchForm, TextFilter};
use serde::Deserialize;
use serde_json::{json, Value};

const LIST_URL: &str = "/drivers/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/drivers/", get(list))
        .route("/drivers/create/", get(create_page).post(create))
        .route("/drivers/:id/", get(detail))
        .route("/drivers/:id/update/", get(update_page).post(update))
        .route("/drivers/:id/delete/", get(delete_page).post(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    username: Option<String>,
    page: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let query = DriverListQuery {
        username: TextFilter::parse(params.username.as_deref()),
        page: PageRequest::parse(params.page.as_deref(), state.config.page_size)?,
    };
    let page = state
        .db
        .with(|conn| DriverService::from_connection(conn)?.list(&query))?;

    let context = list_context(
        "driver_list",
        &page,
        SearchForm::drivers(params.username.as_deref()),
    );
    Ok(render("driver_list", Value::Object(context)))
}

pub async fn detail(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<DriverId>,
) -> AppResult<Response> {
    let detail = state
        .db
        .with(|conn| DriverService::from_connection(conn)?.detail(id))?;
    Ok(render(
        "driver_detail",
        json!({
            "driver": detail.driver,
            "cars": detail.cars,
        }),
    ))
}

pub async fn create_page(_user: CurrentDriver) -> Response {
    render_create_form(&DriverCreationForm::default(), &FormErrors::new())
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = DriverCreationForm::from_data(&FormData::from_pairs(pairs));
    let outcome = state.db.with(|conn| {
        split_form(DriverService::from_connection(conn).and_then(|svc| svc.create(&form)))
    })?;
    Ok(match outcome {
        Ok(id) => found(format!("/drivers/{id}/")),
        Err(errors) => render_create_form(&form, &errors),
    })
}

pub async fn update_page(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<DriverId>,
) -> AppResult<Response> {
    let driver = load(&state, id)?;
    let form = DriverLicenseUpdateForm {
        license_number: driver.license_number.clone().unwrap_or_default(),
    };
    Ok(render_license_form(&form, &FormErrors::new(), &driver))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<DriverId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = DriverLicenseUpdateForm::from_data(&FormData::from_pairs(pairs));
    let outcome = state.db.with(|conn| {
        split_form(
            DriverService::from_connection(conn).and_then(|svc| svc.update_license(id, &form)),
        )
    })?;
    match outcome {
        Ok(()) => Ok(found(LIST_URL)),
        Err(errors) => {
            let driver = load(&state, id)?;
            Ok(render_license_form(&form, &errors, &driver))
        }
    }
}

pub async fn delete_page(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<DriverId>,
) -> AppResult<Response> {
    let driver = load(&state, id)?;
    Ok(render("driver_confirm_delete", json!({ "object": driver })))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<DriverId>,
) -> AppResult<Response> {
    state
        .db
        .with(|conn| DriverService::from_connection(conn)?.delete(id))?;
    Ok(found(LIST_URL))
}

fn load(state: &AppState, id: DriverId) -> AppResult<Driver> {
    state
        .db
        .with(|conn| DriverService::from_connection(conn)?.get(id))
}

fn render_create_form(form: &DriverCreationForm, errors: &FormErrors) -> Response {
    render(
        "driver_form",
        json!({
            "form": form,
            "errors": errors,
        }),
    )
}

fn render_license_form(
    form: &DriverLicenseUpdateForm,
    errors: &FormErrors,
    driver: &Driver,
) -> Response {
    render(
        "driver_license_form",
        json!({
            "form": form,
            "errors": errors,
            "object": driver,
        }),
    )
}
