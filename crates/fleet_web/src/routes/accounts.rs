//! Login and logout.

use crate::app_state::AppState;
use crate::auth::{safe_next, LOGIN_URL};
use crate::error::{split_form, AppResult};
use crate::page::{found, render};
use crate::session::SessionHandle;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use fleet_core::forms::LoginForm;
use fleet_core::service::auth_service::AuthService;
use fleet_core::{FormData, FormErrors};
use serde::Deserialize;
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts/login/", get(login_page).post(login))
        .route("/accounts/logout/", get(logout).post(logout))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    next: Option<String>,
}

pub async fn login_page(Query(params): Query<LoginParams>) -> Response {
    render_login(&LoginForm::default(), &FormErrors::new(), params.next.as_deref())
}

pub async fn login(
    State(state): State<AppState>,
    session: SessionHandle,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let data = FormData::from_pairs(pairs);
    let form = LoginForm::from_data(&data);
    let next = data.get("next");

    let outcome = state.db.with(|conn| {
        split_form(AuthService::from_connection(conn).and_then(|auth| auth.authenticate(&form)))
    })?;

    match outcome {
        Ok(driver_id) => {
            session.lock()?.login(driver_id);
            Ok(found(safe_next(next).unwrap_or("/")))
        }
        Err(errors) => Ok(render_login(&form, &errors, next)),
    }
}

pub async fn logout(session: SessionHandle) -> AppResult<Response> {
    session.lock()?.flush();
    Ok(found(LOGIN_URL))
}

fn render_login(form: &LoginForm, errors: &FormErrors, next: Option<&str>) -> Response {
    render(
        "login",
        json!({
            "form": form,
            "errors": errors,
            "next": next.unwrap_or_default(),
        }),
    )
}
