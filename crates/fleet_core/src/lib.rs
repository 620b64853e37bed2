//! Core domain logic for the fleet service.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod db;
pub mod forms;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use forms::{FormData, FormErrors, SearchForm};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::car::{Car, CarDraft, CarId};
pub use model::driver::{Driver, DriverDraft, DriverId};
pub use model::manufacturer::{Manufacturer, ManufacturerDraft, ManufacturerId};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use search::filter::TextFilter;
pub use search::page::{Page, PageError, PageRequest, DEFAULT_PAGE_SIZE};
pub use service::{ServiceError, ServiceResult};
pub use session::{Session, SessionError, SessionStore, SqliteSessionStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
