//! Login gating for protected pages.
//!
//! # Invariants
//! - Anonymous callers are redirected with `302` to the login page, carrying
//!   the requested path in `next`.
//! - A session pointing at a deleted driver counts as anonymous.

use crate::app_state::AppState;
use crate::page::found;
use crate::session::SessionHandle;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use fleet_core::repo::driver_repo::{DriverRepository, SqliteDriverRepository};
use fleet_core::Driver;

pub const LOGIN_URL: &str = "/accounts/login/";

/// The logged-in driver; rejects anonymous callers with a login redirect.
#[derive(Debug, Clone)]
pub struct CurrentDriver(pub Driver);

#[async_trait]
impl FromRequestParts<AppState> for CurrentDriver {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionHandle::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let user_id = session
            .lock()
            .map_err(IntoResponse::into_response)?
            .auth_user_id();

        let driver = match user_id {
            Some(id) => state
                .db
                .with(|conn| SqliteDriverRepository::try_new(conn)?.get_driver(id))
                .map_err(IntoResponse::into_response)?,
            None => None,
        };

        match driver {
            Some(driver) => Ok(Self(driver)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
                Err(found(login_redirect_url(&next)))
            }
        }
    }
}

/// `/accounts/login/?next=<encoded>` for `next`.
pub fn login_redirect_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", encode_next(next))
}

/// Percent-encodes a query value, keeping `/` literal.
pub fn encode_next(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(char::from(byte));
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

/// Accepts only same-site paths as post-login targets.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim)
        .filter(|value| value.starts_with('/') && !value.starts_with("//"))
        .filter(|value| !value.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::{encode_next, login_redirect_url, safe_next};

    #[test]
    fn login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect_url("/manufacturers/"),
            "/accounts/login/?next=/manufacturers/"
        );
    }

    #[test]
    fn query_characters_are_encoded() {
        assert_eq!(encode_next("/cars/?model=a b&page=2"), "/cars/%3Fmodel%3Da%20b%26page%3D2");
    }

    #[test]
    fn only_local_paths_are_safe() {
        assert_eq!(safe_next(Some("/cars/")), Some("/cars/"));
        assert_eq!(safe_next(Some("//evil.example/")), None);
        assert_eq!(safe_next(Some("https://evil.example/")), None);
        assert_eq!(safe_next(None), None);
    }
}
