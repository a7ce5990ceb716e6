//! Ad-subscription types.
//!
//! One [`AdSubscription`] exists per owner per active plan purchase. It is
//! the single source of truth for quota: `ads_used` and `impressions_used`
//! only move through conditional storage updates, never blind overwrites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PackageId;
use crate::ids::{OwnerRef, SubscriptionId};
use crate::period::BillingWindow;

/// A paid ad subscription for one owner.
///
/// Subscriptions are never deleted; terminal states are `Cancelled` and
/// `Expired` and the record is retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSubscription {
    /// Unique subscription ID (ULID, time-ordered).
    pub id: SubscriptionId,

    /// The owner this subscription belongs to.
    pub owner: OwnerRef,

    /// The purchased package.
    pub package_id: PackageId,

    /// Ad slots available per billing period.
    pub ad_limit: u32,

    /// Impression ceiling per billing period.
    pub impression_limit: u64,

    /// Start of the current billing window (inclusive).
    ///
    /// `None` on legacy records that predate window tracking; the period
    /// refresh initializes it from `start_date`.
    pub period_start: Option<DateTime<Utc>>,

    /// End of the current billing window (exclusive).
    pub period_end: Option<DateTime<Utc>>,

    /// When the subscription was purchased.
    pub start_date: DateTime<Utc>,

    /// Hard expiry for one-time packages; `None` for recurring plans.
    pub end_date: Option<DateTime<Utc>>,

    /// Ad slots consumed in the current period.
    pub ads_used: u32,

    /// Impressions consumed in the current period.
    pub impressions_used: u64,

    /// Lifecycle status.
    pub status: SubscriptionStatus,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AdSubscription {
    /// Create a new active subscription with a window opening at `now`.
    #[must_use]
    pub fn new(
        owner: OwnerRef,
        package_id: PackageId,
        ad_limit: u32,
        impression_limit: u64,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let window = BillingWindow::monthly_from(now);
        Self {
            id: SubscriptionId::generate(),
            owner,
            package_id,
            ad_limit,
            impression_limit,
            period_start: Some(window.start),
            period_end: Some(window.end),
            start_date: now,
            end_date,
            ads_used: 0,
            impressions_used: 0,
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the subscription can back new reservations and events at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.end_date.map_or(true, |end| end > now)
    }

    /// Whether another ad slot can be reserved.
    #[must_use]
    pub fn has_slot_capacity(&self) -> bool {
        self.ads_used < self.ad_limit
    }

    /// Whether another impression can be recorded.
    #[must_use]
    pub fn has_impression_capacity(&self) -> bool {
        self.impressions_used < self.impression_limit
    }

    /// Apply a new billing window, resetting usage counters.
    pub fn apply_window(&mut self, window: BillingWindow, now: DateTime<Utc>) {
        self.period_start = Some(window.start);
        self.period_end = Some(window.end);
        self.ads_used = 0;
        self.impressions_used = 0;
        self.updated_at = now;
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active.
    Active,

    /// Cancelled on explicit request.
    Cancelled,

    /// Expired: `end_date` passed or an external billing event reported
    /// termination.
    Expired,
}

impl SubscriptionStatus {
    /// Get the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

/// Idempotency ledger entry for an inbound billing webhook event.
///
/// Its presence means the event was already applied; redelivery of the same
/// external event ID must be a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEventRecord {
    /// External event identifier from the billing collaborator.
    pub event_id: String,

    /// When the event was first applied.
    pub received_at: DateTime<Utc>,
}
