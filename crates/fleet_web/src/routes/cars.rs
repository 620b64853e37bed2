//! Car pages, including driver self-assignment.

use crate::app_state::AppState;
use crate::auth::CurrentDriver;
use crate::error::{split_form, AppResult};
use crate::page::{found, list_context, render};
use crate::routes::parse_id_filter;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use fleet_core::forms::CarForm;
use fleet_core::repo::car_repo::CarListQuery;
use fleet_core::service::car_service::{CarFormChoices, CarService};
use fleet_core::{
    Car, CarId, FormData, FormErrors, PageRequest, SearchForm, ServiceError, TextFilter,
};
use serde::Deserialize;
use serde_json::{json, Value};

const LIST_URL: &str = "/cars/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cars/", get(list))
        .route("/cars/create/", get(create_page).post(create))
        .route("/cars/:id/", get(detail))
        .route("/cars/:id/update/", get(update_page).post(update))
        .route("/cars/:id/delete/", get(delete_page).post(delete))
        .route("/cars/:id/toggle-assign/", get(toggle_assign).post(toggle_assign))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    model: Option<String>,
    #[serde(rename = "manufacturer_id__exact")]
    manufacturer_id: Option<String>,
    page: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let manufacturer_id = parse_id_filter(
        "manufacturer_id__exact",
        params.manufacturer_id.as_deref(),
    )?;
    let query = CarListQuery {
        model: TextFilter::parse(params.model.as_deref()),
        manufacturer_id,
        page: PageRequest::parse(params.page.as_deref(), state.config.page_size)?,
    };
    let (page, choices) = state.db.with(|conn| {
        let service = CarService::from_connection(conn)?;
        Ok::<_, ServiceError>((service.list(&query)?, service.form_choices()?))
    })?;

    let mut context = list_context("car_list", &page, SearchForm::cars(params.model.as_deref()));
    context.insert("manufacturer_id__exact".to_string(), json!(manufacturer_id));
    context.insert("manufacturers".to_string(), json!(choices.manufacturers));
    Ok(render("car_list", Value::Object(context)))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentDriver(user): CurrentDriver,
    Path(id): Path<CarId>,
) -> AppResult<Response> {
    let car = load(&state, id)?;
    let is_assigned = car.has_driver(user.id);
    Ok(render(
        "car_detail",
        json!({
            "car": car,
            "is_assigned": is_assigned,
        }),
    ))
}

pub async fn create_page(State(state): State<AppState>, _user: CurrentDriver) -> AppResult<Response> {
    let choices = load_choices(&state)?;
    Ok(render_form(&CarForm::default(), &FormErrors::new(), None, &choices))
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = CarForm::from_data(&FormData::from_pairs(pairs));
    let outcome = state.db.with(|conn| {
        split_form(CarService::from_connection(conn).and_then(|svc| svc.create(&form)))
    })?;
    match outcome {
        Ok(_) => Ok(found(LIST_URL)),
        Err(errors) => {
            let choices = load_choices(&state)?;
            Ok(render_form(&form, &errors, None, &choices))
        }
    }
}

pub async fn update_page(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<CarId>,
) -> AppResult<Response> {
    let car = load(&state, id)?;
    let choices = load_choices(&state)?;
    let form = CarForm {
        model: car.model.clone(),
        manufacturer: car.manufacturer.id.to_string(),
        drivers: car.drivers.iter().map(|driver| driver.id.to_string()).collect(),
    };
    Ok(render_form(&form, &FormErrors::new(), Some(&car), &choices))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<CarId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = CarForm::from_data(&FormData::from_pairs(pairs));
    let outcome = state.db.with(|conn| {
        split_form(CarService::from_connection(conn).and_then(|svc| svc.update(id, &form)))
    })?;
    match outcome {
        Ok(()) => Ok(found(LIST_URL)),
        Err(errors) => {
            let car = load(&state, id)?;
            let choices = load_choices(&state)?;
            Ok(render_form(&form, &errors, Some(&car), &choices))
        }
    }
}

pub async fn delete_page(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<CarId>,
) -> AppResult<Response> {
    let car = load(&state, id)?;
    Ok(render("car_confirm_delete", json!({ "object": car })))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<CarId>,
) -> AppResult<Response> {
    state
        .db
        .with(|conn| CarService::from_connection(conn)?.delete(id))?;
    Ok(found(LIST_URL))
}

/// Adds or removes the current driver on the car.
pub async fn toggle_assign(
    State(state): State<AppState>,
    CurrentDriver(user): CurrentDriver,
    Path(id): Path<CarId>,
) -> AppResult<Response> {
    state
        .db
        .with(|conn| CarService::from_connection(conn)?.toggle_assignment(id, user.id))?;
    Ok(found(format!("/cars/{id}/")))
}

fn load(state: &AppState, id: CarId) -> AppResult<Car> {
    state
        .db
        .with(|conn| CarService::from_connection(conn)?.get(id))
}

fn load_choices(state: &AppState) -> AppResult<CarFormChoices> {
    state
        .db
        .with(|conn| CarService::from_connection(conn)?.form_choices())
}

fn render_form(
    form: &CarForm,
    errors: &FormErrors,
    object: Option<&Car>,
    choices: &CarFormChoices,
) -> Response {
    render(
        "car_form",
        json!({
            "form": form,
            "errors": errors,
            "object": object,
            "manufacturers": choices.manufacturers,
            "drivers": choices.drivers,
        }),
    )
}
