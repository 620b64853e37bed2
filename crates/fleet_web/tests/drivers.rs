mod common;

use axum::http::StatusCode;
use common::TestApp;
use fleet_core::{CarId, DriverId};

struct Fixture {
    app: TestApp,
    driver_one: DriverId,
    car: CarId,
}

async fn setup() -> Fixture {
    let (app, _) = TestApp::logged_in("test_driver", Some("ABC12345")).await;
    let driver_one = app.create_driver("driver_one", Some("XYZ12345"));
    app.create_driver("driver_two", Some("XYZ67890"));
    let maker = app.create_manufacturer("test_manufacturer", "");
    let car = app.create_car("test_car", maker, &[driver_one]);
    Fixture {
        app,
        driver_one,
        car,
    }
}

#[tokio::test]
async fn retrieve_drivers() {
    let mut fx = setup().await;
    let res = fx.app.get("/drivers/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.page(), "driver_list");
    assert!(res.contains("driver_one"));
    assert!(res.contains("driver_two"));
    assert!(!res.contains("password_hash"));
}

#[tokio::test]
async fn driver_detail_lists_license_and_cars() {
    let mut fx = setup().await;
    let res = fx.app.get(&format!("/drivers/{}/", fx.driver_one)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.page(), "driver_detail");
    assert_eq!(res.context()["driver"]["username"], "driver_one");
    assert_eq!(res.context()["driver"]["license_number"], "XYZ12345");
    assert_eq!(res.context()["cars"][0]["id"], fx.car);
}

#[tokio::test]
async fn driver_search() {
    let mut fx = setup().await;
    let res = fx.app.get("/drivers/?username=driver_one").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.contains("driver_one"));
    assert!(!res.contains("driver_two"));
    assert_eq!(res.context()["search_form"]["placeholder"], "Search by username");
}

#[tokio::test]
async fn create_driver_redirects_to_detail() {
    let mut fx = setup().await;
    assert_eq!(fx.app.get("/drivers/create/").await.page(), "driver_form");

    fx.app
        .post(
            "/drivers/create/",
            &[
                ("username", "new_driver"),
                ("password1", "new_password123"),
                ("password2", "new_password123"),
                ("license_number", "NEW12345"),
            ],
        )
        .await
        .assert_redirect("/drivers/4/");

    let res = fx.app.get("/drivers/4/").await;
    assert_eq!(res.context()["driver"]["username"], "new_driver");
    assert_eq!(res.context()["driver"]["license_number"], "NEW12345");
}

#[tokio::test]
async fn create_driver_rejects_bad_input() {
    let mut fx = setup().await;
    let res = fx
        .app
        .post(
            "/drivers/create/",
            &[
                ("username", "new_driver"),
                ("password1", "new_password123"),
                ("password2", "other_password123"),
                ("license_number", "XYZ12345"),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.context()["errors"]["password2"][0],
        "The two password fields didn't match."
    );
    assert!(!res.contains("new_password123"));

    let duplicate = fx
        .app
        .post(
            "/drivers/create/",
            &[
                ("username", "new_driver"),
                ("password1", "new_password123"),
                ("password2", "new_password123"),
                ("license_number", "XYZ12345"),
            ],
        )
        .await;
    assert_eq!(
        duplicate.context()["errors"]["license_number"][0],
        "Driver with this License number already exists."
    );
    assert_eq!(
        duplicate.context()["errors"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn update_driver_license() {
    let mut fx = setup().await;
    let url = format!("/drivers/{}/update/", fx.driver_one);
    let page = fx.app.get(&url).await;
    assert_eq!(page.page(), "driver_license_form");
    assert_eq!(page.context()["form"]["license_number"], "XYZ12345");

    fx.app
        .post(&url, &[("license_number", "UPD12345")])
        .await
        .assert_redirect("/drivers/");
    let res = fx.app.get(&format!("/drivers/{}/", fx.driver_one)).await;
    assert_eq!(res.context()["driver"]["license_number"], "UPD12345");
}

#[tokio::test]
async fn invalid_license_reports_first_rule() {
    let mut fx = setup().await;
    let url = format!("/drivers/{}/update/", fx.driver_one);
    for (value, message) in [
        ("UPD1234", "License number should consist of 8 characters"),
        ("upd12345", "First 3 characters should be uppercase letters"),
        ("UPD1234X", "Last 5 characters should be digits"),
    ] {
        let res = fx.app.post(&url, &[("license_number", value)]).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.context()["errors"]["license_number"][0], message);
        assert_eq!(
            res.context()["errors"]["license_number"]
                .as_array()
                .map(Vec::len),
            Some(1)
        );
    }
}

#[tokio::test]
async fn delete_driver() {
    let mut fx = setup().await;
    let url = format!("/drivers/{}/delete/", fx.driver_one);
    let confirm = fx.app.get(&url).await;
    assert_eq!(confirm.status, StatusCode::OK);
    assert_eq!(confirm.page(), "driver_confirm_delete");

    fx.app.post(&url, &[]).await.assert_redirect("/drivers/");
    assert_eq!(
        fx.app.get(&format!("/drivers/{}/", fx.driver_one)).await.status,
        StatusCode::NOT_FOUND
    );
    let car = fx.app.get(&format!("/cars/{}/", fx.car)).await;
    assert_eq!(car.context()["car"]["drivers"], serde_json::json!([]));
}
