//! HTTP surface tests driving the router directly.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use billing_service::api_router;
use common::TestHarness;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: String, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_the_service() {
    let harness = TestHarness::build();
    let router = api_router(harness.app_state());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], "billing-service");
}

#[tokio::test]
async fn readiness_answers_when_the_store_does() {
    let harness = TestHarness::build();
    let router = api_router(harness.app_state());

    let response = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn preview_endpoint_returns_the_breakdown() {
    let harness = TestHarness::build();
    let room_id = harness.seed_scenario_room();
    let router = api_router(harness.app_state());

    let response = router
        .oneshot(
            Request::get(format!(
                "/rooms/{}/invoice-preview?electric=120&water=60",
                room_id
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_amount"], json!(270.0));
    assert_eq!(body["can_send"], json!(true));
}

#[tokio::test]
async fn preview_of_an_unknown_room_is_404() {
    let harness = TestHarness::build();
    let router = api_router(harness.app_state());

    let response = router
        .oneshot(
            Request::get(format!("/rooms/{}/invoice-preview", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_endpoint_persists_and_reports_notification() {
    let harness = TestHarness::build();
    let room_id = harness.seed_scenario_room();
    let router = api_router(harness.app_state());

    let response = router
        .oneshot(json_request(
            "POST",
            format!("/rooms/{}/invoice", room_id),
            json!({
                "month": 7,
                "year": 2026,
                "electric_meter_after": 120.0,
                "water_meter_after": 60.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["invoice"]["total_amount"], json!(270.0));
    assert_eq!(body["invoice"]["status"], "pending");
    assert_eq!(body["notification"]["outcome"], "sent");
}

#[tokio::test]
async fn create_endpoint_validates_the_payload() {
    let harness = TestHarness::build();
    let room_id = harness.seed_scenario_room();
    let router = api_router(harness.app_state());

    let response = router
        .oneshot(json_request(
            "POST",
            format!("/rooms/{}/invoice", room_id),
            json!({
                "month": 13,
                "year": 2026,
                "electric_meter_after": 120.0,
                "water_meter_after": 60.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn qr_payment_without_proof_is_rejected() {
    let harness = TestHarness::build();
    let room_id = harness.seed_scenario_room();
    let router = api_router(harness.app_state());

    let created = router
        .clone()
        .oneshot(json_request(
            "POST",
            format!("/rooms/{}/invoice", room_id),
            json!({
                "month": 7,
                "year": 2026,
                "electric_meter_after": 120.0,
                "water_meter_after": 60.0
            }),
        ))
        .await
        .unwrap();
    let invoice_id = body_json(created).await["invoice"]["invoice_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .oneshot(json_request(
            "POST",
            format!("/invoices/{}/payments", invoice_id),
            json!({ "method": "qr_transfer" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_flow_over_http_settles_the_invoice() {
    let harness = TestHarness::build();
    let room_id = harness.seed_scenario_room();
    let router = api_router(harness.app_state());

    let created = router
        .clone()
        .oneshot(json_request(
            "POST",
            format!("/rooms/{}/invoice", room_id),
            json!({
                "month": 7,
                "year": 2026,
                "electric_meter_after": 120.0,
                "water_meter_after": 60.0
            }),
        ))
        .await
        .unwrap();
    let invoice_id = body_json(created).await["invoice"]["invoice_id"]
        .as_str()
        .unwrap()
        .to_string();

    let submitted = router
        .clone()
        .oneshot(json_request(
            "POST",
            format!("/invoices/{}/payments", invoice_id),
            json!({ "method": "cash" }),
        ))
        .await
        .unwrap();
    assert_eq!(submitted.status(), StatusCode::CREATED);
    let payment_id = body_json(submitted).await["payment_id"]
        .as_str()
        .unwrap()
        .to_string();

    let confirmed = router
        .clone()
        .oneshot(json_request(
            "POST",
            format!("/payments/{}/confirm", payment_id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(confirmed.status(), StatusCode::OK);

    let detail = router
        .oneshot(
            Request::get(format!("/invoices/{}", invoice_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(detail).await;
    assert_eq!(body["invoice"]["status"], "paid");
    assert_eq!(body["payments"][0]["confirmed"], json!(true));
}
