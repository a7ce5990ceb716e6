//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary subscription records, keyed by `subscription_id` (ULID).
    pub const SUBSCRIPTIONS: &str = "subscriptions";

    /// Index: subscriptions by owner, keyed by
    /// `owner_tag || owner_id || subscription_id`. Value is empty.
    pub const SUBSCRIPTIONS_BY_OWNER: &str = "subscriptions_by_owner";

    /// Advertisement records, keyed by `ad_id` (ULID).
    pub const ADS: &str = "ads";

    /// Index: ads by owner, keyed by `owner_tag || owner_id || ad_id`.
    /// Value is empty.
    pub const ADS_BY_OWNER: &str = "ads_by_owner";

    /// Cumulative analytics records, keyed by `ad_id`.
    pub const ANALYTICS: &str = "analytics";

    /// Daily rollups, keyed by `ad_id || date_key`.
    pub const ROLLUPS: &str = "rollups";

    /// Per-day dedup markers, keyed by
    /// `ad_id || date_key || event_tag || fingerprint`. Expire by TTL.
    pub const DEDUPE: &str = "dedupe";

    /// Webhook idempotency ledger, keyed by external `event_id`.
    pub const WEBHOOK_EVENTS: &str = "webhook_events";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::SUBSCRIPTIONS,
        cf::SUBSCRIPTIONS_BY_OWNER,
        cf::ADS,
        cf::ADS_BY_OWNER,
        cf::ANALYTICS,
        cf::ROLLUPS,
        cf::DEDUPE,
        cf::WEBHOOK_EVENTS,
    ]
}
