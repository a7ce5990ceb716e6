//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{ads, analytics, events, health, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for event ingestion endpoints.
/// Event tracking is the high-volume surface and gets its own ceiling.
const EVENTS_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Ads (owner headers)
/// - `POST /v1/ads` - Create an ad (reserves a quota slot)
/// - `POST /v1/ads/:id/activate` - Activate an ad
/// - `POST /v1/ads/:id/deactivate` - Deactivate an ad
///
/// ## Events (high volume, no owner headers)
/// - `POST /v1/ads/:id/events` - Record a viewer event
///
/// ## Analytics (owner headers)
/// - `GET /v1/ads/:id/performance` - Cumulative counters for an ad
/// - `GET /v1/ads/:id/trend?days=N` - Daily rollups for an ad
/// - `GET /v1/campaigns/performance` - Sums across the owner's ads
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/billing` - Billing lifecycle events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Event ingestion takes viewer traffic, so it is limited separately
    // from the management surface.
    let event_routes = Router::new()
        .route("/ads/:id/events", post(events::track_event))
        .layer(ConcurrencyLimitLayer::new(EVENTS_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Ads
        .route("/ads", post(ads::create_ad))
        .route("/ads/:id/activate", post(ads::activate_ad))
        .route("/ads/:id/deactivate", post(ads::deactivate_ad))
        // Analytics
        .route("/ads/:id/performance", get(analytics::ad_performance))
        .route("/ads/:id/trend", get(analytics::ad_trend))
        .route("/campaigns/performance", get(analytics::campaign_performance))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        // Events (with their own concurrency limit)
        .merge(event_routes);

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - controlled by the billing provider)
        .route("/webhooks/billing", post(webhooks::billing_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
