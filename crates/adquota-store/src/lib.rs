//! `RocksDB` storage layer for the adquota campaign engine.
//!
//! This crate provides persistent storage for subscriptions, ads, analytics
//! records, daily rollups, dedup markers, and the webhook idempotency ledger.
//!
//! # Concurrency model
//!
//! The engine is invoked by many independent workers with no shared
//! in-process lock, so every quota-affecting mutation here is a conditional
//! update executed inside a pessimistic `RocksDB` transaction:
//! `get_for_update` takes a key lock, the stored record is checked against
//! the condition the caller observed, and the write commits only if the
//! condition still holds. A condition that no longer holds surfaces as
//! [`StoreError::ConditionFailed`] and never writes anything.
//!
//! # Column families
//!
//! - `subscriptions` / `subscriptions_by_owner`: subscription records + owner index
//! - `ads` / `ads_by_owner`: ad records + owner index
//! - `analytics`: cumulative per-ad counters
//! - `rollups`: per-day counters, keyed `ad_id || date_key`
//! - `dedupe`: per-day event markers with TTL semantics
//! - `webhook_events`: idempotency ledger for inbound billing events

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use adquota_core::{
    Ad, AdEvent, AdId, AdStatus, AdSubscription, AnalyticsRecord, BillingWindow, DailyRollup,
    OwnerRef, SubscriptionId, SubscriptionStatus,
};

/// Everything needed to record one deduplicated ad event atomically.
#[derive(Debug, Clone)]
pub struct RecordEventRequest {
    /// The ad the event targets.
    pub ad_id: AdId,

    /// The subscription charged for impressions; `None` skips quota metering.
    pub subscription_id: Option<SubscriptionId>,

    /// The event being recorded.
    pub event: AdEvent,

    /// UTC date key of the event day.
    pub date_key: String,

    /// Coarse source fingerprint.
    pub fingerprint: String,

    /// Spend added per impression (plan price / impression limit).
    pub spend_delta: f64,

    /// Event timestamp.
    pub now: DateTime<Utc>,

    /// When the dedup marker stops suppressing repeats.
    pub dedupe_expires_at: DateTime<Utc>,
}

/// Outcome of [`Store::record_event`].
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// First occurrence today; counters were incremented.
    Recorded(AnalyticsRecord),

    /// A live dedup marker already existed; nothing was written.
    Duplicate,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (and failure-injecting wrappers in tests).
pub trait Store: Send + Sync {
    // =========================================================================
    // Subscription Operations
    // =========================================================================

    /// Insert or update a subscription record, maintaining the owner index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_subscription(&self, subscription: &AdSubscription) -> Result<()>;

    /// Get a subscription by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_subscription(&self, id: &SubscriptionId) -> Result<Option<AdSubscription>>;

    /// Find the owner's newest subscription that is active at `now`
    /// (status active, `end_date` unexpired).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_active_subscription(
        &self,
        owner: &OwnerRef,
        now: DateTime<Utc>,
    ) -> Result<Option<AdSubscription>>;

    /// Advance the billing window, resetting both usage counters.
    ///
    /// Conditional on the stored `period_end` still equaling
    /// `expected_period_end` (the optimistic concurrency token); exactly one
    /// of several racing callers can win a given transition.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the subscription doesn't exist.
    /// - `StoreError::ConditionFailed` if another caller already advanced it.
    fn advance_period(
        &self,
        id: &SubscriptionId,
        expected_period_end: Option<DateTime<Utc>>,
        window: BillingWindow,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription>;

    /// Reserve one ad slot: increment `ads_used` conditional on
    /// `status == active`, `ads_used < ad_limit`, an unexpired `end_date`,
    /// and the stored `period_end` still equaling the caller's snapshot.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the subscription doesn't exist.
    /// - `StoreError::ConditionFailed` if any condition no longer holds.
    fn reserve_ad_slot(
        &self,
        id: &SubscriptionId,
        expected_period_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription>;

    /// Compensating rollback of a reservation: decrement `ads_used`,
    /// guarded so it never drops below zero.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subscription doesn't exist.
    fn release_ad_slot(&self, id: &SubscriptionId, now: DateTime<Utc>) -> Result<AdSubscription>;

    /// Transition a subscription's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subscription doesn't exist.
    fn set_subscription_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription>;

    /// Renew a subscription: reset both usage counters, reactivate, and open
    /// the given fresh window.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subscription doesn't exist.
    fn renew_subscription(
        &self,
        id: &SubscriptionId,
        window: BillingWindow,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription>;

    // =========================================================================
    // Ad Operations
    // =========================================================================

    /// Persist an ad and its zeroed analytics record atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_ad_with_analytics(&self, ad: &Ad, analytics: &AnalyticsRecord) -> Result<()>;

    /// Get an ad by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_ad(&self, id: &AdId) -> Result<Option<Ad>>;

    /// Set an ad's serving status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the ad doesn't exist.
    fn set_ad_status(&self, id: &AdId, status: AdStatus, now: DateTime<Utc>) -> Result<Ad>;

    /// Count the owner's currently active ads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_active_ads(&self, owner: &OwnerRef) -> Result<u64>;

    /// List the owner's ads, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_ads_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Ad>>;

    // =========================================================================
    // Analytics Operations
    // =========================================================================

    /// Get the cumulative analytics record for an ad.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_analytics(&self, ad_id: &AdId) -> Result<Option<AnalyticsRecord>>;

    /// Get one day's rollup for an ad.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rollup(&self, ad_id: &AdId, date_key: &str) -> Result<Option<DailyRollup>>;

    /// List rollups for an ad within an inclusive date-key range,
    /// chronological order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rollups(
        &self,
        ad_id: &AdId,
        from_key: &str,
        to_key: &str,
    ) -> Result<Vec<DailyRollup>>;

    /// Record one ad event in a single transaction: dedup check, counter
    /// increments on the analytics record, the day's rollup, and (for
    /// impressions) the subscription's `impressions_used`, plus the dedup
    /// marker.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the analytics record or subscription is missing.
    /// - `StoreError::ImpressionLimitExceeded` if the ceiling is hit inside
    ///   the transaction.
    fn record_event(&self, request: &RecordEventRequest) -> Result<RecordOutcome>;

    // =========================================================================
    // Dedup & Webhook Ledger Operations
    // =========================================================================

    /// Record an inbound webhook event ID if it has not been seen.
    ///
    /// Returns `true` when the event is new and the mutation should be
    /// applied, `false` when this is a redelivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn try_record_webhook_event(&self, event_id: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Delete dedup markers whose TTL has passed. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn purge_expired_dedupe(&self, now: DateTime<Utc>) -> Result<u64>;
}
