//! Event metering: dedup, quota charging, and counter updates.

use chrono::{DateTime, Duration, Utc};

use adquota_core::{date_key, AdEvent, AdId, AnalyticsRecord};
use adquota_store::{RecordEventRequest, RecordOutcome, Store, StoreError};

use crate::error::{EngineError, LimitKind, Result};
use crate::QuotaEngine;

/// How long a dedup marker suppresses repeats.
pub(crate) const DEDUPE_TTL_HOURS: i64 = 24;

/// Outcome of tracking one event.
#[derive(Debug, Clone)]
pub enum TrackOutcome {
    /// The event was counted; carries the updated cumulative counters.
    Recorded(AnalyticsRecord),

    /// The same fingerprint already produced this event type for this ad
    /// today. Reported as success to the caller; nothing was counted.
    Duplicate,

    /// The ad is not serving (inactive, or its owner has no active plan);
    /// the event was dropped.
    Skipped,
}

impl<S: Store> QuotaEngine<S> {
    /// Track one ad event from a viewer identified by `fingerprint`.
    ///
    /// At most one event of each type per fingerprint per ad per UTC day is
    /// counted. Impressions additionally charge the owner's subscription
    /// quota and accrue spend at the plan's per-impression rate.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] if the ad does not exist.
    /// - [`EngineError::Validation`] for an empty fingerprint.
    /// - [`EngineError::PlanLimit`] when the impression quota is exhausted.
    pub fn track_event(
        &self,
        ad_id: &AdId,
        event: AdEvent,
        fingerprint: &str,
    ) -> Result<TrackOutcome> {
        self.track_event_at(ad_id, event, fingerprint, Utc::now())
    }

    pub(crate) fn track_event_at(
        &self,
        ad_id: &AdId,
        event: AdEvent,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<TrackOutcome> {
        if fingerprint.is_empty() {
            return Err(EngineError::Validation("fingerprint must not be empty".into()));
        }

        let ad = self.get_ad(ad_id)?;
        if !ad.is_active() {
            tracing::debug!(ad_id = %ad.id, "event dropped for inactive ad");
            return Ok(TrackOutcome::Skipped);
        }

        // Without an active plan the ad should not be serving at all, so the
        // event is dropped rather than rejected.
        let Some(subscription) = self.store.find_active_subscription(&ad.owner, now)? else {
            tracing::debug!(ad_id = %ad.id, "event dropped, owner has no active plan");
            return Ok(TrackOutcome::Skipped);
        };
        let subscription = self.ensure_current_period_at(subscription, now)?;

        // Only impressions charge quota and accrue spend.
        let (subscription_id, spend_delta) = if matches!(event, AdEvent::Impression) {
            if !subscription.has_impression_capacity() {
                self.notifier
                    .limit_hit(&subscription.id, LimitKind::ImpressionLimitReached.as_str());
                return Err(EngineError::limit(
                    LimitKind::ImpressionLimitReached,
                    subscription.impressions_used,
                    subscription.impression_limit,
                ));
            }
            let rate = self
                .catalog
                .get(&subscription.package_id)
                .map_or(0.0, adquota_core::PlanLimits::cost_per_impression);
            (Some(subscription.id), rate)
        } else {
            (None, 0.0)
        };

        let request = RecordEventRequest {
            ad_id: *ad_id,
            subscription_id,
            event,
            date_key: date_key(now),
            fingerprint: fingerprint.to_string(),
            spend_delta,
            now,
            dedupe_expires_at: now + Duration::hours(DEDUPE_TTL_HOURS),
        };

        match self.store.record_event(&request) {
            Ok(RecordOutcome::Recorded(analytics)) => {
                self.notifier.metrics_changed(&ad.owner);
                Ok(TrackOutcome::Recorded(analytics))
            }
            Ok(RecordOutcome::Duplicate) => Ok(TrackOutcome::Duplicate),
            // The advisory capacity check raced another impression; the
            // authoritative in-transaction check caught it.
            Err(StoreError::ImpressionLimitExceeded { used, limit }) => {
                if let Some(id) = &subscription_id {
                    self.notifier
                        .limit_hit(id, LimitKind::ImpressionLimitReached.as_str());
                }
                Err(EngineError::limit(LimitKind::ImpressionLimitReached, used, limit))
            }
            Err(e) => Err(e.into()),
        }
    }
}
