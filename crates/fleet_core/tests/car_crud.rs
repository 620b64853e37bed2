use fleet_core::db::open_db_in_memory;
use fleet_core::repo::car_repo::{CarListQuery, CarRepository, SqliteCarRepository};
use fleet_core::repo::driver_repo::{DriverRepository, SqliteDriverRepository};
use fleet_core::repo::manufacturer_repo::{ManufacturerRepository, SqliteManufacturerRepository};
use fleet_core::{
    CarDraft, DriverDraft, DriverId, ManufacturerDraft, ManufacturerId, PageRequest, RepoError,
    TextFilter,
};
use rusqlite::Connection;

fn manufacturer(conn: &Connection, name: &str) -> ManufacturerId {
    SqliteManufacturerRepository::try_new(conn)
        .unwrap()
        .create_manufacturer(&ManufacturerDraft::new(name, "test_country"))
        .unwrap()
}

fn driver(conn: &Connection, username: &str, license: &str) -> DriverId {
    SqliteDriverRepository::try_new(conn)
        .unwrap()
        .create_driver(
            &DriverDraft::new(username, Some(license.to_string())),
            "not-a-real-hash",
        )
        .unwrap()
}

fn model_query(model: Option<&str>, manufacturer_id: Option<ManufacturerId>) -> CarListQuery {
    CarListQuery {
        model: TextFilter::parse(model),
        manufacturer_id,
        page: PageRequest::default(),
    }
}

#[test]
fn create_persists_manufacturer_and_driver_membership() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarRepository::try_new(&conn).unwrap();
    let maker = manufacturer(&conn, "test_name");
    let first = driver(&conn, "driver1", "AAA11111");
    let second = driver(&conn, "driver2", "BBB22222");
    let _third = driver(&conn, "driver3", "CCC33333");

    let id = repo
        .create_car(&CarDraft::new("test_model", maker, [second, first]))
        .unwrap();

    let car = repo.get_car(id).unwrap().unwrap();
    assert_eq!(car.model, "test_model");
    assert_eq!(car.manufacturer.id, maker);
    assert_eq!(
        car.drivers.iter().map(|d| d.id).collect::<Vec<_>>(),
        vec![first, second]
    );
    assert_eq!(car.to_string(), "test_model");
}

#[test]
fn create_with_unknown_references_fails_atomically() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarRepository::try_new(&conn).unwrap();
    let maker = manufacturer(&conn, "test_name");

    let missing_driver = repo
        .create_car(&CarDraft::new("ghost", maker, [999]))
        .unwrap_err();
    assert!(matches!(missing_driver, RepoError::InvalidReference("car")));

    let missing_maker = repo
        .create_car(&CarDraft::new("ghost", 999, []))
        .unwrap_err();
    assert!(matches!(missing_maker, RepoError::InvalidReference("car")));

    assert_eq!(repo.count_cars().unwrap(), 0);
}

#[test]
fn update_replaces_driver_set() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarRepository::try_new(&conn).unwrap();
    let maker = manufacturer(&conn, "test_name");
    let other_maker = manufacturer(&conn, "other");
    let first = driver(&conn, "driver1", "AAA11111");
    let second = driver(&conn, "driver2", "BBB22222");

    let id = repo
        .create_car(&CarDraft::new("before", maker, [first]))
        .unwrap();
    repo.update_car(id, &CarDraft::new("after", other_maker, [second]))
        .unwrap();

    let car = repo.get_car(id).unwrap().unwrap();
    assert_eq!(car.model, "after");
    assert_eq!(car.manufacturer.name, "other");
    assert!(!car.has_driver(first));
    assert!(car.has_driver(second));

    assert!(matches!(
        repo.update_car(404, &CarDraft::new("x", maker, [])),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn filters_combine_with_and() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarRepository::try_new(&conn).unwrap();
    let first_maker = manufacturer(&conn, "Maker A");
    let second_maker = manufacturer(&conn, "Maker B");
    repo.create_car(&CarDraft::new("Model X", first_maker, []))
        .unwrap();
    repo.create_car(&CarDraft::new("Model Y", first_maker, []))
        .unwrap();
    let wanted = repo
        .create_car(&CarDraft::new("model x sport", second_maker, []))
        .unwrap();

    let by_model = repo.list_cars(&model_query(Some("model x"), None)).unwrap();
    assert_eq!(by_model.total, 2);

    let by_maker = repo
        .list_cars(&model_query(None, Some(second_maker)))
        .unwrap();
    assert_eq!(by_maker.total, 1);

    let both = repo
        .list_cars(&model_query(Some("X"), Some(second_maker)))
        .unwrap();
    assert_eq!(both.items.len(), 1);
    assert_eq!(both.items[0].id, wanted);

    let none = repo
        .list_cars(&model_query(Some("Y"), Some(second_maker)))
        .unwrap();
    assert!(none.items.is_empty());
}

#[test]
fn toggle_flips_membership() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarRepository::try_new(&conn).unwrap();
    let maker = manufacturer(&conn, "test_name");
    let me = driver(&conn, "driver1", "AAA11111");
    let car = repo.create_car(&CarDraft::new("m", maker, [])).unwrap();

    assert!(repo.toggle_driver(car, me).unwrap());
    assert!(repo.get_car(car).unwrap().unwrap().has_driver(me));
    assert_eq!(repo.cars_for_driver(me).unwrap().len(), 1);

    assert!(!repo.toggle_driver(car, me).unwrap());
    assert!(!repo.get_car(car).unwrap().unwrap().has_driver(me));
    assert!(repo.cars_for_driver(me).unwrap().is_empty());

    assert!(matches!(
        repo.toggle_driver(999, me),
        Err(RepoError::NotFound { entity: "car", .. })
    ));
    assert!(matches!(
        repo.toggle_driver(car, 999),
        Err(RepoError::NotFound { entity: "driver", .. })
    ));
}

#[test]
fn deletes_cascade() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCarRepository::try_new(&conn).unwrap();
    let drivers = SqliteDriverRepository::try_new(&conn).unwrap();
    let makers = SqliteManufacturerRepository::try_new(&conn).unwrap();
    let maker = manufacturer(&conn, "test_name");
    let me = driver(&conn, "driver1", "AAA11111");
    let kept = repo.create_car(&CarDraft::new("kept", maker, [me])).unwrap();
    let removed = repo
        .create_car(&CarDraft::new("removed", maker, [me]))
        .unwrap();

    repo.delete_car(removed).unwrap();
    assert!(repo.get_car(removed).unwrap().is_none());
    assert_eq!(repo.cars_for_driver(me).unwrap().len(), 1);

    drivers.delete_driver(me).unwrap();
    assert!(repo.get_car(kept).unwrap().unwrap().drivers.is_empty());

    makers.delete_manufacturer(maker).unwrap();
    assert_eq!(repo.count_cars().unwrap(), 0);
}
