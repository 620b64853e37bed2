//! SQLite session persistence.
//!
//! # Invariants
//! - A record whose `expire_at` is not in the future is treated as absent.
//! - Saving an empty session stores nothing and removes any retired record.

use super::{Session, SessionResult};
use crate::repo::ensure_connection_ready;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Default session lifetime: two weeks.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Storage contract for sessions.
pub trait SessionStore {
    /// Loads a live session by key.
    fn load(&self, key: &str) -> SessionResult<Option<Session>>;
    /// Persists `session` for `ttl` and returns the key to hand to the client.
    ///
    /// Returns `None` when the session is empty and nothing was stored.
    fn save(&self, session: &mut Session, ttl: Duration) -> SessionResult<Option<String>>;
    fn delete(&self, key: &str) -> SessionResult<()>;
    /// Deletes expired records and returns how many were removed.
    fn clear_expired(&self) -> SessionResult<usize>;
}

/// SQLite-backed session store over the `sessions` table.
pub struct SqliteSessionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> SessionResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SessionStore for SqliteSessionStore<'_> {
    fn load(&self, key: &str) -> SessionResult<Option<Session>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT session_data FROM sessions WHERE session_key = ?1 AND expire_at > ?2;",
                params![key, now_ms()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(data) => Ok(Some(Session::from_record(key.to_string(), data))),
            Err(err) => {
                warn!("event=session_load module=session status=error reason=corrupt_data error={err}");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &mut Session, ttl: Duration) -> SessionResult<Option<String>> {
        if let Some(stale) = session.take_stale_key() {
            self.delete(&stale)?;
        }

        if session.is_empty() {
            if let Some(key) = session.key() {
                self.delete(key)?;
            }
            session.mark_saved();
            return Ok(None);
        }

        let key = match session.key() {
            Some(key) => key.to_string(),
            None => new_session_key(),
        };
        let data = serde_json::to_string(session.data())?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expire_at = now_ms().saturating_add(ttl_ms);

        self.conn.execute(
            "INSERT INTO sessions (session_key, session_data, expire_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_key) DO UPDATE SET
                session_data = excluded.session_data,
                expire_at = excluded.expire_at;",
            params![key, data, expire_at],
        )?;

        session.assign_key(key.clone());
        session.mark_saved();
        Ok(Some(key))
    }

    fn delete(&self, key: &str) -> SessionResult<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE session_key = ?1;", [key])?;
        Ok(())
    }

    fn clear_expired(&self) -> SessionResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM sessions WHERE expire_at <= ?1;", [now_ms()])?;
        Ok(removed)
    }
}

fn new_session_key() -> String {
    Uuid::new_v4().simple().to_string()
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
