mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn retrieve_homepage_counts_first_visit() {
    let (mut app, _) = TestApp::logged_in("test_user", None).await;

    let res = app.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.page(), "index");
    assert_eq!(res.context()["num_visits"], 1);
    assert_eq!(app.session_value("num_visits"), Some(json!(1)));
}

#[tokio::test]
async fn visit_counter_equals_number_of_requests() {
    let (mut app, _) = TestApp::logged_in("test_user", None).await;

    for expected in 1..=4 {
        let res = app.get("/").await;
        assert_eq!(res.context()["num_visits"], expected);
    }
    assert_eq!(app.session_value("num_visits"), Some(json!(4)));
}

#[tokio::test]
async fn other_pages_leave_counter_alone() {
    let (mut app, _) = TestApp::logged_in("test_user", None).await;
    app.get("/").await;
    app.get("/cars/").await;
    app.get("/drivers/").await;
    assert_eq!(app.get("/").await.context()["num_visits"], 2);
}

#[tokio::test]
async fn homepage_context_counts() {
    let (mut app, _) = TestApp::logged_in("test_user", None).await;
    app.create_driver("test_driver", Some("ABC12345"));
    let maker = app.create_manufacturer("test_manufacturer_one", "");
    app.create_car("test_car_one", maker, &[]);
    app.create_car("test_car_two", maker, &[]);

    let res = app.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.context()["num_visits"], 1);
    assert_eq!(res.context()["num_manufacturers"], 1);
    assert_eq!(res.context()["num_cars"], 2);
    assert_eq!(res.context()["num_drivers"], 2);
    assert_eq!(res.context()["user"]["username"], "test_user");
}
