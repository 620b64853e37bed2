//! Login use-case.
//!
//! # Invariants
//! - Unknown usernames and wrong passwords produce the same form error.

use crate::auth::verify_password;
use crate::forms::{FormErrors, LoginForm, MSG_INVALID_LOGIN};
use crate::model::driver::DriverId;
use crate::repo::driver_repo::{DriverRepository, SqliteDriverRepository};
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use rusqlite::Connection;

/// Credential check over a driver repository.
pub struct AuthService<D: DriverRepository> {
    drivers: D,
}

impl<'conn> AuthService<SqliteDriverRepository<'conn>> {
    /// Builds the service over a migrated SQLite connection.
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(SqliteDriverRepository::try_new(conn)?))
    }
}

impl<D: DriverRepository> AuthService<D> {
    pub fn new(drivers: D) -> Self {
        Self { drivers }
    }

    /// Returns the driver id when `form` carries valid credentials.
    pub fn authenticate(&self, form: &LoginForm) -> ServiceResult<DriverId> {
        form.validate()?;

        let Some(credentials) = self.drivers.find_credentials(&form.username)? else {
            info!("event=login module=auth status=rejected reason=unknown_user");
            return Err(invalid_login());
        };

        match verify_password(&form.password, &credentials.password_hash) {
            Ok(true) => {
                info!("event=login module=auth status=ok driver_id={}", credentials.id);
                Ok(credentials.id)
            }
            Ok(false) => {
                info!(
                    "event=login module=auth status=rejected reason=bad_password driver_id={}",
                    credentials.id
                );
                Err(invalid_login())
            }
            Err(err) => {
                warn!(
                    "event=login module=auth status=error driver_id={} error={err}",
                    credentials.id
                );
                Err(invalid_login())
            }
        }
    }
}

fn invalid_login() -> ServiceError {
    let mut errors = FormErrors::new();
    errors.add_non_field(MSG_INVALID_LOGIN);
    ServiceError::Form(errors)
}
