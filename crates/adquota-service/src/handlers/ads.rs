//! Ad management handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adquota_core::{Ad, AdId, AdStatus, AdSubscription};

use crate::error::ApiError;
use crate::owner::OwnerIdentity;
use crate::state::AppState;

/// Ad creation request.
#[derive(Debug, Deserialize)]
pub struct CreateAdRequest {
    /// Ad title.
    pub title: String,
}

/// An ad in API responses.
#[derive(Debug, Serialize)]
pub struct AdBody {
    /// Ad ID.
    pub id: String,
    /// Ad title.
    pub title: String,
    /// Serving status.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Ad> for AdBody {
    fn from(ad: &Ad) -> Self {
        Self {
            id: ad.id.to_string(),
            title: ad.title.clone(),
            status: ad.status.as_str().to_string(),
            created_at: ad.created_at,
        }
    }
}

/// Quota usage on the backing subscription.
#[derive(Debug, Serialize)]
pub struct QuotaBody {
    /// Ad slots used this period.
    pub ads_used: u32,
    /// Ad slot ceiling.
    pub ad_limit: u32,
    /// Impressions used this period.
    pub impressions_used: u64,
    /// Impression ceiling.
    pub impression_limit: u64,
}

impl From<&AdSubscription> for QuotaBody {
    fn from(sub: &AdSubscription) -> Self {
        Self {
            ads_used: sub.ads_used,
            ad_limit: sub.ad_limit,
            impressions_used: sub.impressions_used,
            impression_limit: sub.impression_limit,
        }
    }
}

/// Ad creation response.
#[derive(Debug, Serialize)]
pub struct CreateAdResponse {
    /// The created ad.
    pub ad: AdBody,
    /// Quota usage after the reservation.
    pub quota: QuotaBody,
}

/// Create an ad, consuming one ad slot for the current billing period.
pub async fn create_ad(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Json(body): Json<CreateAdRequest>,
) -> Result<(StatusCode, Json<CreateAdResponse>), ApiError> {
    let (ad, subscription) = state.engine.create_ad(&owner, &body.title)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAdResponse {
            ad: AdBody::from(&ad),
            quota: QuotaBody::from(&subscription),
        }),
    ))
}

/// Activate an ad.
pub async fn activate_ad(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Path(id): Path<String>,
) -> Result<Json<AdBody>, ApiError> {
    set_status(&state, &owner, &id, AdStatus::Active)
}

/// Deactivate an ad. The period slot it consumed stays spent.
pub async fn deactivate_ad(
    State(state): State<Arc<AppState>>,
    OwnerIdentity(owner): OwnerIdentity,
    Path(id): Path<String>,
) -> Result<Json<AdBody>, ApiError> {
    set_status(&state, &owner, &id, AdStatus::Inactive)
}

fn set_status(
    state: &AppState,
    owner: &adquota_core::OwnerRef,
    id: &str,
    status: AdStatus,
) -> Result<Json<AdBody>, ApiError> {
    let ad_id = parse_ad_id(id)?;
    let ad = state.engine.get_ad(&ad_id)?;
    // Other owners' ads are indistinguishable from missing ones.
    if ad.owner != *owner {
        return Err(ApiError::NotFound(format!("ad: {ad_id}")));
    }

    let updated = state.engine.set_ad_status(&ad_id, status)?;
    Ok(Json(AdBody::from(&updated)))
}

pub(crate) fn parse_ad_id(id: &str) -> Result<AdId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest("invalid ad ID".into()))
}
