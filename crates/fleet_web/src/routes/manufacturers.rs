//! Manufacturer pages.

use crate::app_state::AppState;
use crate::auth::CurrentDriver;
use crate::error::{split_form, AppResult};
use crate::page::{found, list_context, render};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use fleet_core::forms::ManufacturerForm;
use fleet_core::repo::manufacturer_repo::ManufacturerListQuery;
use fleet_core::service::manufacturer_service::ManufacturerService;
use fleet_core::{FormData, FormErrors, Manufacturer, ManufacturerId, PageRequest, SearchForm, TextFilter};
use serde::Deserialize;
use serde_json::{json, Value};

const LIST_URL: &str = "/manufacturers/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manufacturers/", get(list))
        .route("/manufacturers/create/", get(create_page).post(create))
        .route("/manufacturers/:id/update/", get(update_page).post(update))
        .route("/manufacturers/:id/delete/", get(delete_page).post(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    name: Option<String>,
    page: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let query = ManufacturerListQuery {
        name: TextFilter::parse(params.name.as_deref()),
        page: PageRequest::parse(params.page.as_deref(), state.config.page_size)?,
    };
    let page = state
        .db
        .with(|conn| ManufacturerService::from_connection(conn)?.list(&query))?;

    let context = list_context(
        "manufacturer_list",
        &page,
        SearchForm::manufacturers(params.name.as_deref()),
    );
    Ok(render("manufacturer_list", Value::Object(context)))
}

pub async fn create_page(_user: CurrentDriver) -> Response {
    render_form(&ManufacturerForm::default(), &FormErrors::new(), None)
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = ManufacturerForm::from_data(&FormData::from_pairs(pairs));
    let outcome = state.db.with(|conn| {
        split_form(ManufacturerService::from_connection(conn).and_then(|svc| svc.create(&form)))
    })?;
    Ok(match outcome {
        Ok(_) => found(LIST_URL),
        Err(errors) => render_form(&form, &errors, None),
    })
}

pub async fn update_page(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<ManufacturerId>,
) -> AppResult<Response> {
    let manufacturer = load(&state, id)?;
    let form = ManufacturerForm {
        name: manufacturer.name.clone(),
        country: manufacturer.country.clone(),
    };
    Ok(render_form(&form, &FormErrors::new(), Some(&manufacturer)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<ManufacturerId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = ManufacturerForm::from_data(&FormData::from_pairs(pairs));
    let outcome = state.db.with(|conn| {
        split_form(ManufacturerService::from_connection(conn).and_then(|svc| svc.update(id, &form)))
    })?;
    match outcome {
        Ok(()) => Ok(found(LIST_URL)),
        Err(errors) => {
            let manufacturer = load(&state, id)?;
            Ok(render_form(&form, &errors, Some(&manufacturer)))
        }
    }
}

pub async fn delete_page(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<ManufacturerId>,
) -> AppResult<Response> {
    let manufacturer = load(&state, id)?;
    Ok(render(
        "manufacturer_confirm_delete",
        json!({ "object": manufacturer }),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<ManufacturerId>,
) -> AppResult<Response> {
    state
        .db
        .with(|conn| ManufacturerService::from_connection(conn)?.delete(id))?;
    Ok(found(LIST_URL))
}

fn load(state: &AppState, id: ManufacturerId) -> AppResult<Manufacturer> {
    state
        .db
        .with(|conn| ManufacturerService::from_connection(conn)?.get(id))
}

fn render_form(
    form: &ManufacturerForm,
    errors: &FormErrors,
    object: Option<&Manufacturer>,
) -> Response {
    render(
        "manufacturer_form",
        json!({
            "form": form,
            "errors": errors,
            "object": object,
        }),
    )
}
