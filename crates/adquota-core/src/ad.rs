//! Advertisement types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AdId, OwnerRef};

/// A paid advertisement.
///
/// An `Ad` is created only after a successful quota reservation; its
/// existence is the proof that the reservation succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    /// Unique ad ID (ULID, time-ordered).
    pub id: AdId,

    /// The owner this ad belongs to.
    pub owner: OwnerRef,

    /// Display title.
    pub title: String,

    /// Whether the ad is currently serving.
    pub status: AdStatus,

    /// When the ad was created.
    pub created_at: DateTime<Utc>,

    /// When the ad was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Ad {
    /// Create a new active ad.
    #[must_use]
    pub fn new(owner: OwnerRef, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id: AdId::generate(),
            owner,
            title,
            status: AdStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the ad accrues metrics.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AdStatus::Active
    }
}

/// Serving status of an ad. Inactive ads simply stop accruing metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    /// The ad is serving and accrues metrics.
    Active,
    /// The ad is paused.
    Inactive,
}

impl AdStatus {
    /// Get the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}
