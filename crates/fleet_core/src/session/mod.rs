//! Server-side sessions.
//!
//! # Responsibility
//! - Hold per-visitor state as a JSON object keyed by a random token.
//! - Track whether a request changed the state so it is persisted only then.
//!
//! # Invariants
//! - A session without a key has never been stored.
//! - `login` and `flush` retire the current key; the store deletes the retired
//!   record on the next save.

use crate::model::driver::DriverId;
use crate::repo::RepoError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod store;

pub use store::{SessionStore, SqliteSessionStore, DEFAULT_SESSION_TTL_SECS};

/// Session key holding the logged-in driver id.
pub const SESSION_KEY_AUTH_USER_ID: &str = "_auth_user_id";
/// Session key holding the home page visit counter.
pub const NUM_VISITS_KEY: &str = "num_visits";

pub type SessionResult<T> = Result<T, SessionError>;

/// Session persistence failure.
#[derive(Debug)]
pub enum SessionError {
    Storage(RepoError),
    Encode(serde_json::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "session storage failed: {err}"),
            Self::Encode(err) => write!(f, "session data encoding failed: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(RepoError::from(value))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// One visitor's session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    key: Option<String>,
    data: Map<String, Value>,
    modified: bool,
    stale_key: Option<String>,
}

impl Session {
    /// Creates an empty, not yet persisted session.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_record(key: String, data: Map<String, Value>) -> Self {
        Self {
            key: Some(key),
            data,
            modified: false,
            stale_key: None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.data.insert(name.into(), value);
        self.modified = true;
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.data.remove(name);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Adds one to the integer stored under `name` and returns the new value.
    ///
    /// Missing or non-integer values count as zero.
    pub fn increment(&mut self, name: &str) -> u64 {
        let next = self
            .data
            .get(name)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .saturating_add(1);
        self.insert(name, Value::from(next));
        next
    }

    /// Returns the logged-in driver id, if any.
    pub fn auth_user_id(&self) -> Option<DriverId> {
        match self.data.get(SESSION_KEY_AUTH_USER_ID)? {
            Value::String(raw) => raw.parse().ok(),
            Value::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    /// Marks `driver_id` as logged in and cycles the session key.
    pub fn login(&mut self, driver_id: DriverId) {
        if self.auth_user_id().is_some_and(|current| current != driver_id) {
            self.data.clear();
        }
        self.cycle_key();
        self.insert(SESSION_KEY_AUTH_USER_ID, Value::String(driver_id.to_string()));
    }

    /// Drops all data and retires the key.
    pub fn flush(&mut self) {
        self.data.clear();
        self.cycle_key();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    fn cycle_key(&mut self) {
        if let Some(old) = self.key.take() {
            self.stale_key.get_or_insert(old);
        }
        self.modified = true;
    }

    pub(crate) fn take_stale_key(&mut self) -> Option<String> {
        self.stale_key.take()
    }

    pub(crate) fn assign_key(&mut self, key: String) {
        self.key = Some(key);
    }

    pub(crate) fn mark_saved(&mut self) {
        self.modified = false;
    }
}
