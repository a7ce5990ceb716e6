//! Event ingestion integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

async fn create_ad(harness: &TestHarness) -> String {
    let response = harness
        .server
        .post("/v1/ads")
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .json(&json!({ "title": "Ad" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["ad"]["id"].as_str().unwrap().to_string()
}

async fn send_event(
    harness: &TestHarness,
    ad_id: &str,
    event: serde_json::Value,
    viewer_ip: &str,
) -> axum_test::TestResponse {
    harness
        .server
        .post(&format!("/v1/ads/{ad_id}/events"))
        .add_header("x-forwarded-for", viewer_ip.to_string())
        .add_header("user-agent", "Mozilla/5.0 (test)")
        .json(&event)
        .await
}

#[tokio::test]
async fn impression_is_recorded_with_spend() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard"); // 39.0 / 1000 impressions
    let ad_id = create_ad(&harness).await;

    let response = send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.7").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"], "recorded");
    assert_eq!(body["performance"]["impressions"], 1);
    assert_eq!(body["performance"]["reach"], 1);
    let spend = body["performance"]["spend"].as_f64().unwrap();
    assert!((spend - 0.039).abs() < 1e-9);
}

#[tokio::test]
async fn same_viewer_same_day_is_a_duplicate() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness).await;

    send_event(&harness, &ad_id, json!({ "type": "click" }), "203.0.113.7")
        .await
        .assert_status_ok();

    let response = send_event(&harness, &ad_id, json!({ "type": "click" }), "203.0.113.7").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"], "duplicate");
    assert!(body.get("performance").is_none());
}

#[tokio::test]
async fn different_viewers_count_separately() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness).await;

    send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.7")
        .await
        .assert_status_ok();
    let response = send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.8").await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"], "recorded");
    assert_eq!(body["performance"]["impressions"], 2);
}

#[tokio::test]
async fn engagement_events_carry_a_kind() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness).await;

    let response = send_event(
        &harness,
        &ad_id,
        json!({ "type": "engagement", "kind": "like" }),
        "203.0.113.7",
    )
    .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"], "recorded");
    assert_eq!(body["performance"]["engagement"], 1);
    assert_eq!(body["performance"]["likes"], 1);
}

#[tokio::test]
async fn exhausted_impression_quota_is_forbidden() {
    let harness = TestHarness::new();
    harness.seed_subscription_with_limits(5, 1);
    let ad_id = create_ad(&harness).await;

    send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.7")
        .await
        .assert_status_ok();

    let response = send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.8").await;
    response.assert_status(StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "impression_limit_reached");
    assert_eq!(body["error"]["details"]["used"], 1);
    assert_eq!(body["error"]["details"]["limit"], 1);
}

#[tokio::test]
async fn inactive_ad_skips_events() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness).await;

    harness
        .server
        .post(&format!("/v1/ads/{ad_id}/deactivate"))
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .await
        .assert_status_ok();

    let response = send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.7").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["outcome"], "skipped");
}

#[tokio::test]
async fn unknown_ad_is_not_found() {
    let harness = TestHarness::new();

    let response = send_event(
        &harness,
        "01ARZ3NDEKTSV4RRFFQ69G5FAV",
        json!({ "type": "click" }),
        "203.0.113.7",
    )
    .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
