//! Home page aggregates: entity counts and the per-session visit counter.

use crate::repo::car_repo::{CarRepository, SqliteCarRepository};
use crate::repo::driver_repo::{DriverRepository, SqliteDriverRepository};
use crate::repo::manufacturer_repo::{ManufacturerRepository, SqliteManufacturerRepository};
use crate::service::ServiceResult;
use crate::session::{Session, NUM_VISITS_KEY};
use rusqlite::Connection;
use serde::Serialize;

/// Live entity counts; computed per request, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub num_manufacturers: u64,
    pub num_cars: u64,
    pub num_drivers: u64,
}

/// Counts every entity through the given repositories.
pub fn count_entities(
    manufacturers: &impl ManufacturerRepository,
    cars: &impl CarRepository,
    drivers: &impl DriverRepository,
) -> ServiceResult<DashboardCounts> {
    Ok(DashboardCounts {
        num_manufacturers: manufacturers.count_manufacturers()?,
        num_cars: cars.count_cars()?,
        num_drivers: drivers.count_drivers()?,
    })
}

/// Counts every entity on a migrated SQLite connection.
pub fn dashboard_counts(conn: &Connection) -> ServiceResult<DashboardCounts> {
    count_entities(
        &SqliteManufacturerRepository::try_new(conn)?,
        &SqliteCarRepository::try_new(conn)?,
        &SqliteDriverRepository::try_new(conn)?,
    )
}

/// Increments the session's home page visit counter and returns the new value.
pub fn record_home_visit(session: &mut Session) -> u64 {
    session.increment(NUM_VISITS_KEY)
}

#[cfg(test)]
mod tests {
    use super::record_home_visit;
    use crate::session::Session;

    #[test]
    fn visit_counter_counts_every_call() {
        let mut session = Session::new();
        for expected in 1..=3 {
            assert_eq!(record_home_visit(&mut session), expected);
        }
    }
}
