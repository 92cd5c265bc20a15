use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use netbar_api::Money;
use netbar_api::message::Command;
use netbar_server::models::EndReason;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;

mod common;
use common::mock_app::MockApp;

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().uri(uri).method(method);

    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_list_seats() {
    let app = MockApp::new().await;
    let now = OffsetDateTime::now_utc();
    app.telemetry("D1", "iu=0;sec=0;pc=1", now).await;
    app.telemetry("D2", "iu=0;sec=0", now - Duration::from_secs(120)).await;
    app.engine.set_maintenance("D1", true).await.unwrap();

    let response = app.router.clone().oneshot(request(Method::GET, "/seats", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seats = body_json(response).await;
    let seats = seats.as_array().unwrap();
    assert_eq!(seats.len(), 2);
    assert_eq!(seats[0]["device_id"], json!("D1"));
    assert_eq!(seats[0]["display_status"], json!("maintenance"));
    assert_eq!(seats[0]["pc_on"], json!(true));
    assert_eq!(seats[1]["device_id"], json!("D2"));
    assert_eq!(seats[1]["display_status"], json!("offline"));
}

#[tokio::test]
async fn test_admin_checkout() {
    let app = MockApp::new().await;
    app.user("C1", "10.00").await;
    let start = OffsetDateTime::now_utc();
    app.swipe("D1", "C1", start).await;
    app.telemetry("D1", "iu=1;sec=90", start).await;

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D1/checkout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let settled = body_json(response).await;
    assert_eq!(settled["duration_sec"], json!(90));
    assert_eq!(settled["fee"], json!("1.50"));
    assert_eq!(settled["balance_after"], json!("8.50"));
    assert_eq!(settled["end_reason"], json!("admin_stop"));

    assert_eq!(
        app.commands("D1").await.last(),
        Some(&Command::Checkout {
            code: "admin_stop".to_string(),
            msg: "admin_checkout".to_string(),
        })
    );
    assert_eq!(app.sessions("D1").await[0].end_reason, Some(EndReason::AdminStop));

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D1/checkout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(app.balance("C1").await, Money::from_cents(850));

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D9/checkout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error = body_json(response).await;
    assert_eq!(error["error"]["code"], json!(404));
}

#[tokio::test]
async fn test_maintenance_toggle() {
    let app = MockApp::new().await;
    app.telemetry("D1", "iu=0;sec=0", OffsetDateTime::now_utc()).await;

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D1/maintenance", Some(json!({ "enabled": true }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.device("D1").await.is_maintenance);

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D1/maintenance", Some(json!({ "enabled": false }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!app.device("D1").await.is_maintenance);

    assert_eq!(app.commands("D1").await, vec![Command::MaintOn, Command::MaintOff]);
}

#[tokio::test]
async fn test_seat_command() {
    let app = MockApp::new().await;
    app.telemetry("D1", "iu=0;sec=0", OffsetDateTime::now_utc()).await;

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D1/command/pc_on", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(app.last_command("D1").await, Some(Command::PcOn));

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D1/command/self_destruct", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/seats/D9/command/reset", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_update_is_broadcast() {
    let app = MockApp::new().await;
    let now = OffsetDateTime::now_utc();
    app.telemetry("D1", "iu=0;sec=0", now).await;
    app.telemetry("D2", "iu=0;sec=0", now).await;

    let response = app.router.clone().oneshot(request(Method::GET, "/rate", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "rate": "1.00" }));

    let response = app
        .router
        .clone()
        .oneshot(request(Method::PUT, "/rate", Some(json!({ "rate": "1.50" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.engine.rate().await.unwrap(), Money::from_cents(150));

    for device_id in ["D1", "D2"] {
        assert_eq!(
            app.last_command(device_id).await.map(|c| c.encode()),
            Some("set_rate;val=1.50".to_string())
        );
    }

    let response = app
        .router
        .clone()
        .oneshot(request(Method::PUT, "/rate", Some(json!({ "rate": "-1.00" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.engine.rate().await.unwrap(), Money::from_cents(150));
}

#[tokio::test]
async fn test_new_rate_applies_at_settlement() {
    let app = MockApp::new().await;
    app.user("C1", "10.00").await;
    let start = OffsetDateTime::now_utc();
    app.swipe("D1", "C1", start).await;
    app.telemetry("D1", "iu=1;sec=60", start).await;

    app.engine.set_rate(Money::from_cents(200)).await.unwrap();
    app.telemetry("D1", "iu=0;sec=0", start).await;

    assert_eq!(app.sessions("D1").await[0].fee, Money::from_cents(200));
    assert_eq!(app.balance("C1").await, Money::from_cents(800));
}

#[tokio::test]
async fn test_recharge() {
    let app = MockApp::new().await;
    app.user("C1", "0.50").await;

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/users/c1/recharge", Some(json!({ "amount": "10.00" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "card_uid": "C1", "balance": "10.50" })
    );
    assert_eq!(app.balance("C1").await, Money::from_cents(1050));

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/users/C1/recharge", Some(json!({ "amount": "0" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(request(Method::POST, "/users/C9/recharge", Some(json!({ "amount": "5" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
