//! Inbound billing webhook handler.
//!
//! The billing provider signs each delivery with HMAC-SHA256 over the raw
//! body. Deliveries are at-least-once; idempotency comes from the engine's
//! event-id ledger, so replays acknowledge without re-applying.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use adquota_core::{OwnerRef, PackageId, SubscriptionId};
use adquota_engine::{BillingAction, WebhookOutcome};

use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the raw body.
const SIGNATURE_HEADER: &str = "x-billing-signature";

/// Billing webhook payload.
#[derive(Debug, Deserialize)]
pub struct BillingWebhook {
    /// Unique delivery event ID.
    pub id: String,
    /// Event type, e.g. `subscription.renewed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: serde_json::Value,
}

/// Payload of `subscription.created` events.
#[derive(Debug, Deserialize)]
struct SubscriptionCreated {
    owner_id: String,
    owner_type: String,
    package_id: String,
    #[serde(default)]
    ad_limit: Option<u32>,
    #[serde(default)]
    duration_days: Option<i64>,
}

/// Payload of lifecycle events targeting an existing subscription.
#[derive(Debug, Deserialize)]
struct SubscriptionTarget {
    subscription_id: String,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the delivery was accepted.
    pub received: bool,
    /// Whether this delivery applied a mutation (false for replays and
    /// unhandled event types).
    pub processed: bool,
}

/// Handle billing webhooks.
pub async fn billing_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    verify_signature(&state, &headers, &body)?;

    let webhook: BillingWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "Received billing webhook"
    );

    let Some(action) = parse_action(&webhook)? else {
        tracing::debug!(event_type = %webhook.event_type, "Unhandled billing event");
        return Ok(Json(WebhookResponse {
            received: true,
            processed: false,
        }));
    };

    let outcome = state.engine.apply_billing_event(&webhook.id, &action)?;
    let processed = matches!(outcome, WebhookOutcome::Applied(_));

    Ok(Json(WebhookResponse {
        received: true,
        processed,
    }))
}

fn verify_signature(state: &AppState, headers: &HeaderMap, body: &str) -> Result<(), ApiError> {
    let Some(secret) = &state.config.webhook_secret else {
        // No secret configured - skip verification (development mode)
        tracing::warn!("webhook_secret not configured - skipping signature verification");
        return Ok(());
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".into()))?;

    let expected = hmac_sha256_hex(secret, body);
    if !constant_time_eq(signature, &expected) {
        tracing::warn!("Invalid billing webhook signature");
        return Err(ApiError::BadRequest("Invalid webhook signature".into()));
    }

    Ok(())
}

fn parse_action(webhook: &BillingWebhook) -> Result<Option<BillingAction>, ApiError> {
    let action = match webhook.event_type.as_str() {
        "subscription.created" => {
            let data: SubscriptionCreated = parse_data(&webhook.data)?;
            let owner_id = data
                .owner_id
                .parse()
                .map_err(|_| ApiError::BadRequest("invalid owner_id".into()))?;
            let owner_type = data
                .owner_type
                .parse()
                .map_err(|_| ApiError::BadRequest("invalid owner_type".into()))?;
            BillingAction::Create {
                owner: OwnerRef::new(owner_id, owner_type),
                package_id: PackageId::from(data.package_id.as_str()),
                ad_limit: data.ad_limit,
                duration_days: data.duration_days,
            }
        }
        "subscription.renewed" => BillingAction::Renew(parse_target(&webhook.data)?),
        "subscription.cancelled" => BillingAction::Cancel(parse_target(&webhook.data)?),
        "subscription.expired" => BillingAction::Expire(parse_target(&webhook.data)?),
        _ => return Ok(None),
    };
    Ok(Some(action))
}

fn parse_data<T: serde::de::DeserializeOwned>(data: &serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(data.clone()).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_target(data: &serde_json::Value) -> Result<SubscriptionId, ApiError> {
    let target: SubscriptionTarget = parse_data(data)?;
    target
        .subscription_id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid subscription_id".into()))
}
