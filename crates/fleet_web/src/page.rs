//! Page payloads and redirects.
//!
//! A page is a JSON document naming the view and carrying the values a
//! template would render: `{"page": "<name>", "context": {...}}`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleet_core::Page;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Serialize)]
struct PagePayload<'a> {
    page: &'a str,
    context: Value,
}

/// Renders `name` with `context` as a 200 response.
pub fn render(name: &str, context: Value) -> Response {
    (
        StatusCode::OK,
        Json(PagePayload {
            page: name,
            context,
        }),
    )
        .into_response()
}

/// `302 Found` to `location`.
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// Builds a list page context: items under `list_key` plus paginator fields.
pub fn list_context<T: Serialize>(
    list_key: &str,
    page: &Page<T>,
    search_form: impl Serialize,
) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert(list_key.to_string(), json!(page.items));
    context.insert("result_count".to_string(), json!(page.total));
    context.insert("page".to_string(), json!(page.number));
    context.insert("num_pages".to_string(), json!(page.num_pages()));
    context.insert("has_previous".to_string(), json!(page.has_previous()));
    context.insert("has_next".to_string(), json!(page.has_next()));
    context.insert("is_paginated".to_string(), json!(page.num_pages() > 1));
    context.insert("search_form".to_string(), json!(search_form));
    context
}
