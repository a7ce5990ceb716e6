//! Analytics read handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adquota_core::{AnalyticsRecord, DailyRollup};
use adquota_engine::OwnerPerformance;

use crate::error::ApiError;
use crate::handlers::ads::parse_ad_id;
use crate::owner::OwnerIdentity;
use crate::state::AppState;

/// Default trend length when `days` is not given.
const DEFAULT_TREND_DAYS: u32 = 7;

/// Cumulative performance counters for one ad.
#[derive(Debug, Serialize)]
pub struct PerformanceBody {
    /// Total impressions.
    pub impressions: u64,
    /// Total clicks.
    pub clicks: u64,
    /// Click-through rate in percent.
    pub ctr: f64,
    /// Viewers reached.
    pub reach: u64,
    /// Total engagements.
    pub engagement: u64,
    /// Likes.
    pub likes: u64,
    /// Comments.
    pub comments: u64,
    /// Shares.
    pub shares: u64,
    /// Total conversions.
    pub conversions: u64,
    /// Accrued spend.
    pub spend: f64,
    /// Last counter change.
    pub last_updated: DateTime<Utc>,
}

impl From<&AnalyticsRecord> for PerformanceBody {
    fn from(record: &AnalyticsRecord) -> Self {
        Self {
            impressions: record.impressions,
            clicks: record.clicks,
            ctr: record.ctr,
            reach: record.reach,
            engagement: record.engagement,
            likes: record.engagement_breakdown.likes,
            comments: record.engagement_breakdown.comments,
            shares: record.engagement_breakdown.shares,
            conversions: record.conversions,
            spend: record.spend,
            last_updated: record.last_updated,
        }
    }
}

/// One day in a trend response.
#[derive(Debug, Serialize)]
pub struct TrendDay {
    /// UTC date key (`YYYY-MM-DD`).
    pub date: String,
    /// Impressions on this day.
    pub impressions: u64,
    /// Clicks on this day.
    pub clicks: u64,
    /// Engagements on this day.
    pub engagement: u64,
    /// Conversions on this day.
    pub conversions: u64,
    /// Distinct viewers who saw the ad this day.
    pub unique_reach: u64,
}

impl From<&DailyRollup> for TrendDay {
    fn from(rollup: &DailyRollup) -> Self {
        Self {
            date: rollup.date_key.clone(),
            impressions: rollup.impressions,
            clicks: rollup.clicks,
            engagement: rollup.engagement,
            conversions: rollup.conversions,
            unique_reach: rollup.unique_reach,
        }
    }
}

/// Trend query parameters.
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// How many days back to include, today included.
    pub days: Option<u32>,
}

/// Trend response.
#[derive(Debug, Serialize)]
pub struct TrendResponse {
    /// Days with activity, chronological.
    pub days: Vec<TrendDay>,
    /// Unique reach summed over the window.
    pub unique_reach: u64,
}

/// Get cumulative performance for one ad.
pub async fn ad_performance(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Path(id): Path<String>,
) -> Result<Json<PerformanceBody>, ApiError> {
    let ad_id = parse_ad_id(&id)?;
    let ad = state.engine.get_ad(&ad_id)?;
    if ad.owner != owner {
        return Err(ApiError::NotFound(format!("ad: {ad_id}")));
    }

    let record = state.engine.ad_performance(&ad_id)?;
    Ok(Json(PerformanceBody::from(&record)))
}

/// Get the daily trend for one ad.
pub async fn ad_trend(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Path(id): Path<String>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<TrendResponse>, ApiError> {
    let ad_id = parse_ad_id(&id)?;
    let ad = state.engine.get_ad(&ad_id)?;
    if ad.owner != owner {
        return Err(ApiError::NotFound(format!("ad: {ad_id}")));
    }

    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    let rollups = state.engine.daily_trend(&ad_id, days)?;
    let unique_reach = rollups.iter().map(|day| day.unique_reach).sum();

    Ok(Json(TrendResponse {
        days: rollups.iter().map(TrendDay::from).collect(),
        unique_reach,
    }))
}

/// Get performance summed across all of the caller's ads.
pub async fn campaign_performance(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
) -> Result<Json<OwnerPerformance>, ApiError> {
    let performance = state.engine.owner_performance(&owner)?;
    Ok(Json(performance))
}
