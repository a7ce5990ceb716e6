//! Analytics endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

async fn create_ad(harness: &TestHarness, title: &str) -> String {
    let response = harness
        .server
        .post("/v1/ads")
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .json(&json!({ "title": title }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["ad"]["id"].as_str().unwrap().to_string()
}

async fn send_event(harness: &TestHarness, ad_id: &str, event: serde_json::Value, ip: &str) {
    harness
        .server
        .post(&format!("/v1/ads/{ad_id}/events"))
        .add_header("x-forwarded-for", ip.to_string())
        .add_header("user-agent", "Mozilla/5.0 (test)")
        .json(&event)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn performance_reflects_tracked_events() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness, "Ad").await;

    send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.7").await;
    send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.8").await;
    send_event(&harness, &ad_id, json!({ "type": "click" }), "203.0.113.7").await;

    let response = harness
        .server
        .get(&format!("/v1/ads/{ad_id}/performance"))
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["impressions"], 2);
    assert_eq!(body["clicks"], 1);
    let ctr = body["ctr"].as_f64().unwrap();
    assert!((ctr - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn trend_defaults_to_a_week() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness, "Ad").await;

    send_event(&harness, &ad_id, json!({ "type": "impression" }), "203.0.113.7").await;

    let response = harness
        .server
        .get(&format!("/v1/ads/{ad_id}/trend"))
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["days"].as_array().unwrap().len(), 1);
    assert_eq!(body["days"][0]["impressions"], 1);
    assert_eq!(body["days"][0]["unique_reach"], 1);
    assert_eq!(body["unique_reach"], 1);
}

#[tokio::test]
async fn trend_rejects_invalid_day_counts() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness, "Ad").await;

    let response = harness
        .server
        .get(&format!("/v1/ads/{ad_id}/trend?days=0"))
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = harness
        .server
        .get(&format!("/v1/ads/{ad_id}/trend?days=365"))
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn campaign_performance_sums_across_ads() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let first = create_ad(&harness, "First").await;
    let second = create_ad(&harness, "Second").await;

    send_event(&harness, &first, json!({ "type": "impression" }), "203.0.113.7").await;
    send_event(&harness, &second, json!({ "type": "impression" }), "203.0.113.7").await;
    send_event(&harness, &second, json!({ "type": "conversion" }), "203.0.113.7").await;

    let response = harness
        .server
        .get("/v1/campaigns/performance")
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_ads"], 2);
    assert_eq!(body["active_ads"], 2);
    assert_eq!(body["impressions"], 2);
    assert_eq!(body["conversions"], 1);
}

#[tokio::test]
async fn other_owners_analytics_look_missing() {
    let harness = TestHarness::new();
    harness.seed_subscription("standard");
    let ad_id = create_ad(&harness, "Private").await;

    let response = harness
        .server
        .get(&format!("/v1/ads/{ad_id}/performance"))
        .add_header("x-owner-id", uuid::Uuid::new_v4().to_string())
        .add_header("x-owner-type", "user")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
