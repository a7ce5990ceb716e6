//! Core types and utilities for the adquota campaign engine.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Identifiers**: `OwnerId`, `SubscriptionId`, `AdId`, `OwnerRef`
//! - **Subscriptions**: `AdSubscription`, `SubscriptionStatus`
//! - **Ads**: `Ad`, `AdStatus`
//! - **Analytics**: `AnalyticsRecord`, `DailyRollup`, `AdEvent`, `DedupeRecord`
//! - **Catalog**: `PlanCatalog`, `PlanLimits`, `PackageId`
//! - **Periods**: `BillingWindow` and the catch-up math
//!
//! # Billing windows
//!
//! A billing period is the half-open interval `[period_start, period_end)`.
//! Usage counters (`ads_used`, `impressions_used`) accumulate inside a
//! window and reset when it advances. All counter mutations go through
//! conditional storage updates; this crate holds only the pure types and
//! window math.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ad;
pub mod analytics;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod period;
pub mod subscription;

pub use ad::{Ad, AdStatus};
pub use analytics::{
    ctr, date_key, AdEvent, AnalyticsRecord, DailyRollup, DedupeRecord, EngagementBreakdown,
    EngagementKind, EventType,
};
pub use catalog::{PackageId, PlanCatalog, PlanLimits};
pub use error::{CoreError, Result};
pub use ids::{AdId, IdError, OwnerId, OwnerRef, OwnerType, SubscriptionId};
pub use period::{
    add_one_month, catch_up, BillingWindow, DEFAULT_PERIOD_DAYS, MAX_CATCH_UP_MONTHS,
};
pub use subscription::{AdSubscription, SubscriptionStatus, WebhookEventRecord};
