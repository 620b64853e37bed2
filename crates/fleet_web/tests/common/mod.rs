#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use fleet_core::auth::hash_password;
use fleet_core::repo::car_repo::{CarRepository, SqliteCarRepository};
use fleet_core::repo::driver_repo::{DriverRepository, SqliteDriverRepository};
use fleet_core::repo::manufacturer_repo::{ManufacturerRepository, SqliteManufacturerRepository};
use fleet_core::{
    open_db_in_memory, CarDraft, CarId, DriverDraft, DriverId, ManufacturerDraft, ManufacturerId,
};
use fleet_web::app_state::{AppState, Database};
use fleet_web::build_app;
use fleet_web::config::ServerConfig;
use rusqlite::Connection;
use serde_json::Value;
use std::sync::OnceLock;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "password123";

/// One argon2 hash shared by every seeded driver.
fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).unwrap())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

impl TestResponse {
    pub fn page(&self) -> &str {
        self.body["page"].as_str().unwrap_or_default()
    }

    pub fn context(&self) -> &Value {
        &self.body["context"]
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.body.to_string().contains(needle)
    }

    pub fn assert_redirect(&self, location: &str) {
        assert_eq!(self.status, StatusCode::FOUND, "body: {}", self.body);
        assert_eq!(self.location.as_deref(), Some(location));
    }
}

/// In-process client with a cookie jar holding only `sessionid`.
pub struct TestApp {
    router: Router,
    pub db: Database,
    session_key: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(open_db_in_memory().unwrap(), ServerConfig::default());
        Self {
            router: build_app(state.clone()),
            db: state.db,
            session_key: None,
        }
    }

    /// Creates a driver and logs in as them.
    pub async fn logged_in(username: &str, license: Option<&str>) -> (Self, DriverId) {
        let mut app = Self::new();
        let id = app.create_driver(username, license);
        let res = app
            .post(
                "/accounts/login/",
                &[("username", username), ("password", TEST_PASSWORD)],
            )
            .await;
        res.assert_redirect("/");
        (app, id)
    }

    pub fn with_conn<T>(&self, work: impl FnOnce(&Connection) -> T) -> T {
        self.db
            .with(|conn| Ok::<_, fleet_core::RepoError>(work(conn)))
            .unwrap()
    }

    pub fn create_driver(&self, username: &str, license: Option<&str>) -> DriverId {
        self.with_conn(|conn| {
            SqliteDriverRepository::try_new(conn)
                .unwrap()
                .create_driver(
                    &DriverDraft::new(username, license.map(str::to_string)),
                    test_password_hash(),
                )
                .unwrap()
        })
    }

    pub fn create_manufacturer(&self, name: &str, country: &str) -> ManufacturerId {
        self.with_conn(|conn| {
            SqliteManufacturerRepository::try_new(conn)
                .unwrap()
                .create_manufacturer(&ManufacturerDraft::new(name, country))
                .unwrap()
        })
    }

    pub fn create_car(
        &self,
        model: &str,
        manufacturer_id: ManufacturerId,
        drivers: &[DriverId],
    ) -> CarId {
        self.with_conn(|conn| {
            SqliteCarRepository::try_new(conn)
                .unwrap()
                .create_car(&CarDraft::new(model, manufacturer_id, drivers.iter().copied()))
                .unwrap()
        })
    }

    /// Reads a value from the current session record.
    pub fn session_value(&self, name: &str) -> Option<Value> {
        let key = self.session_key.clone()?;
        let raw: String = self.with_conn(|conn| {
            conn.query_row(
                "SELECT session_data FROM sessions WHERE session_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .unwrap()
        });
        let data: Value = serde_json::from_str(&raw).unwrap();
        data.get(name).cloned()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, uri, Some(encode_form(form))).await
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = &self.session_key {
            builder = builder.header(COOKIE, format!("sessionid={key}"));
        }
        let body = match form {
            Some(encoded) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(encoded)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        for value in response.headers().get_all(SET_COOKIE) {
            let value = value.to_str().unwrap();
            if let Some(rest) = value.strip_prefix("sessionid=") {
                if value.contains("Max-Age=0") {
                    self.session_key = None;
                } else {
                    self.session_key = rest.split(';').next().map(str::to_string);
                }
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            location,
            body,
        }
    }
}

fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                char::from(byte).to_string()
            }
            other => format!("%{other:02X}"),
        })
        .collect()
}
