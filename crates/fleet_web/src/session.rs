//! Cookie-backed session middleware.
//!
//! # Responsibility
//! - Load the caller's session from the `sessionid` cookie before the handler.
//! - Persist it afterwards when the handler changed it and re-issue the cookie.
//!
//! # Invariants
//! - Unknown, expired or corrupt cookies yield a fresh empty session.
//! - Unmodified sessions cost no write.

use crate::app_state::AppState;
use crate::error::AppError;
use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use fleet_core::{Session, SessionStore, SqliteSessionStore};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const SESSION_COOKIE_NAME: &str = "sessionid";

/// Request-scoped handle to the caller's session.
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    /// Locks the session; do not hold the guard across an await.
    pub fn lock(&self) -> Result<MutexGuard<'_, Session>, AppError> {
        self.0
            .lock()
            .map_err(|_| AppError::Internal("session lock poisoned".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session middleware not installed".to_string()))
    }
}

/// Loads and saves the session around the inner handler.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie_key = session_cookie(request.headers());
    let session = match cookie_key.as_deref() {
        Some(key) => state
            .db
            .with(|conn| SqliteSessionStore::try_new(conn)?.load(key))?
            .unwrap_or_default(),
        None => Session::new(),
    };

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let saved_key = {
        let mut session = handle.lock()?;
        if !session.is_modified() {
            return Ok(response);
        }
        let ttl = state.config.session_ttl;
        state
            .db
            .with(|conn| SqliteSessionStore::try_new(conn)?.save(&mut session, ttl))?
    };

    match saved_key {
        Some(key) => {
            debug!("event=session_save module=web status=ok");
            append_cookie(&mut response, &session_cookie_value(&key, state.config.session_ttl))?;
        }
        None if cookie_key.is_some() => {
            debug!("event=session_clear module=web status=ok");
            append_cookie(&mut response, &expired_cookie_value())?;
        }
        None => {}
    }
    Ok(response)
}

/// Extracts the `sessionid` value from the `Cookie` headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie_value(key: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={key}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    )
}

fn expired_cookie_value() -> String {
    format!("{SESSION_COOKIE_NAME}=\"\"; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

fn append_cookie(response: &mut Response, value: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(value)
        .map_err(|err| AppError::Internal(format!("invalid cookie header: {err}")))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{session_cookie, session_cookie_value};
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, HeaderValue};
    use std::time::Duration;

    #[test]
    fn finds_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("csrftoken=abc; sessionid=0123abcd; theme=dark"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("0123abcd"));
    }

    #[test]
    fn missing_or_blank_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(session_cookie(&headers), None);
    }

    #[test]
    fn cookie_carries_attributes() {
        let value = session_cookie_value("k", Duration::from_secs(60));
        assert_eq!(value, "sessionid=k; HttpOnly; Path=/; SameSite=Lax; Max-Age=60");
    }
}
