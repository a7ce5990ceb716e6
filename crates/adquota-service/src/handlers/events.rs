//! Viewer event ingestion.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use adquota_core::AdEvent;
use adquota_engine::TrackOutcome;

use crate::crypto::viewer_fingerprint;
use crate::error::ApiError;
use crate::handlers::ads::parse_ad_id;
use crate::handlers::analytics::PerformanceBody;
use crate::state::AppState;

/// Event tracking response. Duplicates are reported as success so clients
/// never retry them.
#[derive(Debug, Serialize)]
pub struct TrackEventResponse {
    /// `recorded`, `duplicate`, or `skipped`.
    pub outcome: &'static str,
    /// Updated counters, present only when the event was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceBody>,
}

/// Record one viewer event against an ad.
///
/// The viewer is identified by a coarse fingerprint derived from the
/// forwarded client address and user agent; at most one event of each type
/// per viewer per ad per UTC day is counted.
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(event): Json<AdEvent>,
) -> Result<Json<TrackEventResponse>, ApiError> {
    let ad_id = parse_ad_id(&id)?;
    let fingerprint = fingerprint_from_headers(&headers);

    let outcome = state.engine.track_event(&ad_id, event, &fingerprint)?;
    let response = match outcome {
        TrackOutcome::Recorded(analytics) => TrackEventResponse {
            outcome: "recorded",
            performance: Some(PerformanceBody::from(&analytics)),
        },
        TrackOutcome::Duplicate => TrackEventResponse {
            outcome: "duplicate",
            performance: None,
        },
        TrackOutcome::Skipped => TrackEventResponse {
            outcome: "skipped",
            performance: None,
        },
    };

    Ok(Json(response))
}

/// Derive the viewer fingerprint from request headers.
///
/// `x-forwarded-for` may carry a proxy chain; only the client hop (first
/// entry) participates.
fn fingerprint_from_headers(headers: &HeaderMap) -> String {
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map_or("unknown", str::trim);

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    viewer_fingerprint(client_ip, user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn fingerprint_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));

        let direct = {
            let mut h = HeaderMap::new();
            h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
            h.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));
            fingerprint_from_headers(&h)
        };

        assert_eq!(fingerprint_from_headers(&headers), direct);
    }

    #[test]
    fn missing_headers_still_fingerprint() {
        let fp = fingerprint_from_headers(&HeaderMap::new());
        assert!(!fp.is_empty());
    }
}
