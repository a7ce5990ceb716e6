//! Request and response types for the adquota client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Viewer event kinds accepted by the metering endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackEvent {
    /// A viewer saw the ad.
    Impression,
    /// A viewer clicked through.
    Click,
    /// A viewer engaged with the creative.
    Engagement {
        /// Engagement kind ("like", "comment" or "share").
        kind: String,
    },
    /// A viewer completed the tracked goal.
    Conversion,
}

/// Request body for creating an ad.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAdRequest {
    /// Display title of the ad.
    pub title: String,
}

/// An ad as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct AdBody {
    /// The ad identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Current status ("active" or "inactive").
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Quota usage on the owning subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaBody {
    /// Ad slots consumed this billing period.
    pub ads_used: u32,
    /// Ad slot ceiling for the period.
    pub ad_limit: u32,
    /// Impressions consumed this billing period.
    pub impressions_used: u64,
    /// Impression ceiling for the period.
    pub impression_limit: u64,
}

/// Response from creating an ad.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdResponse {
    /// The created ad.
    pub ad: AdBody,
    /// Quota usage after the reservation.
    pub quota: QuotaBody,
}

/// Lifetime performance counters for an ad.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceBody {
    /// Total impressions.
    pub impressions: u64,
    /// Total clicks.
    pub clicks: u64,
    /// Click-through rate as a percentage.
    pub ctr: f64,
    /// Distinct viewers seen.
    pub reach: u64,
    /// Total engagements.
    pub engagement: u64,
    /// Likes.
    pub likes: u64,
    /// Comments.
    pub comments: u64,
    /// Shares.
    pub shares: u64,
    /// Conversions.
    pub conversions: u64,
    /// Accumulated spend.
    pub spend: f64,
    /// When the counters last changed.
    pub last_updated: DateTime<Utc>,
}

/// Response from tracking a viewer event.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackEventResponse {
    /// "recorded", "duplicate" or "skipped".
    pub outcome: String,
    /// Performance after the event, when it was recorded.
    pub performance: Option<PerformanceBody>,
}

/// One day of rollup data in a trend.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendDay {
    /// UTC day key (YYYY-MM-DD).
    pub date: String,
    /// Impressions on that day.
    pub impressions: u64,
    /// Clicks on that day.
    pub clicks: u64,
    /// Engagements on that day.
    pub engagement: u64,
    /// Conversions on that day.
    pub conversions: u64,
    /// Distinct viewers on that day.
    pub unique_reach: u64,
}

/// Daily trend response.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendResponse {
    /// Days with recorded activity, oldest first.
    pub days: Vec<TrendDay>,
    /// Sum of per-day distinct viewers over the window.
    pub unique_reach: u64,
}

/// Aggregated performance across all of an owner's ads.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignPerformance {
    /// Ads owned, in any status.
    pub total_ads: u64,
    /// Ads currently active.
    pub active_ads: u64,
    /// Total impressions across ads.
    pub impressions: u64,
    /// Total clicks across ads.
    pub clicks: u64,
    /// Click-through rate recomputed over the sums.
    pub ctr: f64,
    /// Total distinct-viewer reach.
    pub reach: u64,
    /// Total engagements.
    pub engagement: u64,
    /// Total conversions.
    pub conversions: u64,
    /// Total spend.
    pub spend: f64,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// "healthy" when the service is up.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
