use fleet_core::db::open_db_in_memory;
use fleet_core::session::{NUM_VISITS_KEY, SESSION_KEY_AUTH_USER_ID};
use fleet_core::{Session, SessionStore, SqliteSessionStore};
use serde_json::Value;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

#[test]
fn save_assigns_key_and_load_restores_data() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSessionStore::try_new(&conn).unwrap();

    let mut session = Session::new();
    session.increment(NUM_VISITS_KEY);
    let key = store.save(&mut session, TTL).unwrap().unwrap();
    assert_eq!(key.len(), 32);
    assert_eq!(session.key(), Some(key.as_str()));
    assert!(!session.is_modified());

    let mut loaded = store.load(&key).unwrap().unwrap();
    assert_eq!(loaded.get(NUM_VISITS_KEY), Some(&Value::from(1_u64)));
    assert_eq!(loaded.increment(NUM_VISITS_KEY), 2);
}

#[test]
fn empty_session_is_not_stored() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSessionStore::try_new(&conn).unwrap();
    let mut session = Session::new();
    assert!(store.save(&mut session, TTL).unwrap().is_none());

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn expired_sessions_are_absent_and_cleared() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSessionStore::try_new(&conn).unwrap();

    let mut session = Session::new();
    session.increment(NUM_VISITS_KEY);
    let key = store.save(&mut session, Duration::ZERO).unwrap().unwrap();

    assert!(store.load(&key).unwrap().is_none());
    assert_eq!(store.clear_expired().unwrap(), 1);
}

#[test]
fn login_rotates_key_and_drops_old_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSessionStore::try_new(&conn).unwrap();

    let mut session = Session::new();
    session.increment(NUM_VISITS_KEY);
    let anonymous_key = store.save(&mut session, TTL).unwrap().unwrap();

    session.login(5);
    let authenticated_key = store.save(&mut session, TTL).unwrap().unwrap();
    assert_ne!(anonymous_key, authenticated_key);
    assert!(store.load(&anonymous_key).unwrap().is_none());

    let loaded = store.load(&authenticated_key).unwrap().unwrap();
    assert_eq!(loaded.auth_user_id(), Some(5));
    assert_eq!(
        loaded.get(SESSION_KEY_AUTH_USER_ID),
        Some(&Value::from("5"))
    );
    assert_eq!(loaded.get(NUM_VISITS_KEY), Some(&Value::from(1_u64)));
}

#[test]
fn flush_deletes_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSessionStore::try_new(&conn).unwrap();

    let mut session = Session::new();
    session.login(1);
    let key = store.save(&mut session, TTL).unwrap().unwrap();

    let mut loaded = store.load(&key).unwrap().unwrap();
    loaded.flush();
    assert!(store.save(&mut loaded, TTL).unwrap().is_none());
    assert!(store.load(&key).unwrap().is_none());
}

#[test]
fn corrupt_records_are_treated_as_absent() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO sessions (session_key, session_data, expire_at) VALUES ('bad', 'not json', 9999999999999);",
        [],
    )
    .unwrap();
    let store = SqliteSessionStore::try_new(&conn).unwrap();
    assert!(store.load("bad").unwrap().is_none());
}
