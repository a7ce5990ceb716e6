//! Billing webhook integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

async fn post_webhook(harness: &TestHarness, body: &serde_json::Value) -> axum_test::TestResponse {
    let raw = body.to_string();
    harness
        .server
        .post("/webhooks/billing")
        .add_header("x-billing-signature", TestHarness::sign_webhook(&raw))
        .add_header("content-type", "application/json")
        .text(raw)
        .await
}

#[tokio::test]
async fn purchase_event_provisions_a_subscription() {
    let harness = TestHarness::new();

    let response = post_webhook(
        &harness,
        &json!({
            "id": "evt_purchase_1",
            "type": "subscription.created",
            "data": {
                "owner_id": harness.owner_id_header(),
                "owner_type": harness.owner_type_header(),
                "package_id": "standard"
            }
        }),
    )
    .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], true);
    assert_eq!(body["processed"], true);

    // The owner can now create ads.
    harness
        .server
        .post("/v1/ads")
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .json(&json!({ "title": "Funded" }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn renewal_resets_usage_counters() {
    let harness = TestHarness::new();
    let sub = harness.seed_subscription("starter");

    // Spend both slots.
    for title in ["First", "Second"] {
        harness
            .server
            .post("/v1/ads")
            .add_header("x-owner-id", harness.owner_id_header())
            .add_header("x-owner-type", harness.owner_type_header())
            .json(&json!({ "title": title }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = post_webhook(
        &harness,
        &json!({
            "id": "evt_renew_1",
            "type": "subscription.renewed",
            "data": { "subscription_id": sub.id.to_string() }
        }),
    )
    .await;
    response.assert_status_ok();

    let renewed = harness.engine.get_subscription(&sub.id).unwrap();
    assert_eq!(renewed.ads_used, 0);
    assert_eq!(renewed.impressions_used, 0);
}

#[tokio::test]
async fn redelivery_is_acknowledged_but_not_reapplied() {
    let harness = TestHarness::new();
    let sub = harness.seed_subscription("standard");

    let payload = json!({
        "id": "evt_cancel_1",
        "type": "subscription.cancelled",
        "data": { "subscription_id": sub.id.to_string() }
    });

    let first: serde_json::Value = post_webhook(&harness, &payload).await.json();
    assert_eq!(first["processed"], true);

    let replay: serde_json::Value = post_webhook(&harness, &payload).await.json();
    assert_eq!(replay["received"], true);
    assert_eq!(replay["processed"], false);
}

#[tokio::test]
async fn cancellation_blocks_new_ads() {
    let harness = TestHarness::new();
    let sub = harness.seed_subscription("standard");

    post_webhook(
        &harness,
        &json!({
            "id": "evt_cancel_2",
            "type": "subscription.cancelled",
            "data": { "subscription_id": sub.id.to_string() }
        }),
    )
    .await
    .assert_status_ok();

    let response = harness
        .server
        .post("/v1/ads")
        .add_header("x-owner-id", harness.owner_id_header())
        .add_header("x-owner-type", harness.owner_type_header())
        .json(&json!({ "title": "Too late" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_event_types_are_acknowledged() {
    let harness = TestHarness::new();

    let response = post_webhook(
        &harness,
        &json!({
            "id": "evt_other_1",
            "type": "invoice.settled",
            "data": {}
        }),
    )
    .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], true);
    assert_eq!(body["processed"], false);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/webhooks/billing")
        .add_header("content-type", "application/json")
        .text(json!({ "id": "evt_x", "type": "subscription.renewed", "data": {} }).to_string())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_signature_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/webhooks/billing")
        .add_header("x-billing-signature", "deadbeef".to_string())
        .add_header("content-type", "application/json")
        .text(json!({ "id": "evt_x", "type": "subscription.renewed", "data": {} }).to_string())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
