//! Analytics types: per-ad cumulative counters, per-day rollups, tracked
//! events, and the per-day deduplication marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AdId;

/// Format a timestamp as a UTC date key (`YYYY-MM-DD`).
#[must_use]
pub fn date_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// A metered ad event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdEvent {
    /// The ad was shown.
    Impression,
    /// The ad was clicked.
    Click,
    /// The viewer engaged with the ad.
    Engagement {
        /// The kind of engagement.
        kind: EngagementKind,
    },
    /// The viewer converted.
    Conversion,
}

impl AdEvent {
    /// The dedup bucket this event falls into. A fingerprint can register one
    /// event of each type per ad per day independently.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Impression => EventType::Impression,
            Self::Click => EventType::Click,
            Self::Engagement { .. } => EventType::Engagement,
            Self::Conversion => EventType::Conversion,
        }
    }
}

/// The coarse event type used in dedup keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An impression.
    Impression,
    /// A click.
    Click,
    /// An engagement of any kind.
    Engagement,
    /// A conversion.
    Conversion,
}

impl EventType {
    /// Get the event type as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::Click => "click",
            Self::Engagement => "engagement",
            Self::Conversion => "conversion",
        }
    }

    /// Single-byte tag used in storage key encodings.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Impression => 0,
            Self::Click => 1,
            Self::Engagement => 2,
            Self::Conversion => 3,
        }
    }
}

/// Engagement sub-type, bucketed for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    /// A like.
    Like,
    /// A comment.
    Comment,
    /// A share.
    Share,
}

/// Cumulative engagement counters by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementBreakdown {
    /// Like count.
    pub likes: u64,
    /// Comment count.
    pub comments: u64,
    /// Share count.
    pub shares: u64,
}

/// Cumulative per-ad counters, mutated only by the usage meter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    /// The ad these counters belong to.
    pub ad_id: AdId,

    /// Total recorded impressions.
    pub impressions: u64,

    /// Total recorded clicks.
    pub clicks: u64,

    /// Click-through rate in percent; derived, recomputed on every write.
    pub ctr: f64,

    /// Unique viewers reached (one per fingerprint per day).
    pub reach: u64,

    /// Total engagements across all kinds.
    pub engagement: u64,

    /// Engagement counters by kind.
    pub engagement_breakdown: EngagementBreakdown,

    /// Total conversions.
    pub conversions: u64,

    /// Accumulated spend (flat cost per impression from the plan).
    pub spend: f64,

    /// When the counters last changed.
    pub last_updated: DateTime<Utc>,
}

impl AnalyticsRecord {
    /// Create a zeroed record for a freshly reserved ad.
    #[must_use]
    pub fn new(ad_id: AdId, now: DateTime<Utc>) -> Self {
        Self {
            ad_id,
            impressions: 0,
            clicks: 0,
            ctr: 0.0,
            reach: 0,
            engagement: 0,
            engagement_breakdown: EngagementBreakdown::default(),
            conversions: 0,
            spend: 0.0,
            last_updated: now,
        }
    }

    /// Apply one deduplicated event and recompute the CTR.
    ///
    /// `spend_delta` is non-zero only for impressions (plan price divided by
    /// the plan's impression limit).
    pub fn apply(&mut self, event: AdEvent, spend_delta: f64, now: DateTime<Utc>) {
        match event {
            AdEvent::Impression => {
                self.impressions += 1;
                // Dedup admits one impression per fingerprint per day, so a
                // recorded impression is also a unit of reach.
                self.reach += 1;
                self.spend += spend_delta;
            }
            AdEvent::Click => self.clicks += 1,
            AdEvent::Engagement { kind } => {
                self.engagement += 1;
                match kind {
                    EngagementKind::Like => self.engagement_breakdown.likes += 1,
                    EngagementKind::Comment => self.engagement_breakdown.comments += 1,
                    EngagementKind::Share => self.engagement_breakdown.shares += 1,
                }
            }
            AdEvent::Conversion => self.conversions += 1,
        }
        self.ctr = ctr(self.clicks, self.impressions);
        self.last_updated = now;
    }
}

/// Click-through rate in percent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ctr(clicks: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        0.0
    } else {
        clicks as f64 / impressions as f64 * 100.0
    }
}

/// Per-UTC-day counters for one ad. Append-only increments, one row per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRollup {
    /// The ad these counters belong to.
    pub ad_id: AdId,

    /// UTC date key (`YYYY-MM-DD`).
    pub date_key: String,

    /// Impressions recorded on this day.
    pub impressions: u64,

    /// Clicks recorded on this day.
    pub clicks: u64,

    /// Engagements recorded on this day.
    pub engagement: u64,

    /// Conversions recorded on this day.
    pub conversions: u64,

    /// Distinct fingerprints that produced an impression on this day.
    pub unique_reach: u64,
}

impl DailyRollup {
    /// Create a zeroed rollup row for one day.
    #[must_use]
    pub fn new(ad_id: AdId, date_key: String) -> Self {
        Self {
            ad_id,
            date_key,
            impressions: 0,
            clicks: 0,
            engagement: 0,
            conversions: 0,
            unique_reach: 0,
        }
    }

    /// Apply one deduplicated event.
    pub fn apply(&mut self, event: AdEvent) {
        match event {
            AdEvent::Impression => {
                self.impressions += 1;
                self.unique_reach += 1;
            }
            AdEvent::Click => self.clicks += 1,
            AdEvent::Engagement { .. } => self.engagement += 1,
            AdEvent::Conversion => self.conversions += 1,
        }
    }
}

/// Marker recording "this fingerprint already produced this event type for
/// this ad on this day".
///
/// The fingerprint is a coarse network/client signal, not an authenticated
/// identity; under- or over-counting in edge cases is accepted. Markers
/// expire roughly a day after creation and expired markers are treated as
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupeRecord {
    /// The ad the event targeted.
    pub ad_id: AdId,

    /// UTC date key of the event.
    pub date_key: String,

    /// The deduplicated event type.
    pub event_type: EventType,

    /// The coarse source fingerprint.
    pub fingerprint: String,

    /// When the marker was created.
    pub created_at: DateTime<Utc>,

    /// When the marker stops suppressing repeats.
    pub expires_at: DateTime<Utc>,
}

impl DedupeRecord {
    /// Whether the marker still suppresses repeats at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_is_utc_day() {
        let at = chrono::DateTime::parse_from_rfc3339("2026-08-30T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(date_key(at), "2026-08-30");
    }

    #[test]
    fn ctr_handles_zero_impressions() {
        assert_eq!(ctr(5, 0), 0.0);
        assert!((ctr(5, 200) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn impression_updates_spend_reach_and_ctr() {
        let now = Utc::now();
        let mut record = AnalyticsRecord::new(AdId::generate(), now);

        record.apply(AdEvent::Impression, 0.039, now);
        assert_eq!(record.impressions, 1);
        assert_eq!(record.reach, 1);
        assert!((record.spend - 0.039).abs() < 1e-12);
        assert_eq!(record.ctr, 0.0);

        record.apply(AdEvent::Click, 0.0, now);
        assert_eq!(record.clicks, 1);
        assert!((record.ctr - 100.0).abs() < 1e-12);
    }

    #[test]
    fn engagement_buckets_by_kind() {
        let now = Utc::now();
        let mut record = AnalyticsRecord::new(AdId::generate(), now);

        record.apply(
            AdEvent::Engagement {
                kind: EngagementKind::Like,
            },
            0.0,
            now,
        );
        record.apply(
            AdEvent::Engagement {
                kind: EngagementKind::Share,
            },
            0.0,
            now,
        );

        assert_eq!(record.engagement, 2);
        assert_eq!(record.engagement_breakdown.likes, 1);
        assert_eq!(record.engagement_breakdown.shares, 1);
        assert_eq!(record.engagement_breakdown.comments, 0);
    }

    #[test]
    fn rollup_counts_unique_reach_per_impression() {
        let mut rollup = DailyRollup::new(AdId::generate(), "2026-08-30".into());
        rollup.apply(AdEvent::Impression);
        rollup.apply(AdEvent::Conversion);
        assert_eq!(rollup.impressions, 1);
        assert_eq!(rollup.unique_reach, 1);
        assert_eq!(rollup.conversions, 1);
    }

    #[test]
    fn dedupe_marker_expiry() {
        let now = Utc::now();
        let marker = DedupeRecord {
            ad_id: AdId::generate(),
            date_key: date_key(now),
            event_type: EventType::Impression,
            fingerprint: "fp".into(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(24),
        };
        assert!(marker.is_live(now));
        assert!(!marker.is_live(now + chrono::Duration::hours(25)));
    }
}
