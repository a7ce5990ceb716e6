//! Analytics reads: per-ad performance, owner-wide aggregates, daily trends.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use adquota_core::{ctr, date_key, AdId, AnalyticsRecord, DailyRollup, OwnerRef};
use adquota_store::Store;

use crate::error::{EngineError, Result};
use crate::QuotaEngine;

/// Longest daily trend a caller may request.
pub const MAX_TREND_DAYS: u32 = 90;

/// Aggregate performance across all of an owner's ads.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerPerformance {
    /// Total ads, active or not.
    pub total_ads: u64,

    /// Currently active ads.
    pub active_ads: u64,

    /// Summed impressions.
    pub impressions: u64,

    /// Summed clicks.
    pub clicks: u64,

    /// Click-through rate over the summed counters, in percent.
    pub ctr: f64,

    /// Summed reach.
    pub reach: u64,

    /// Summed engagements.
    pub engagement: u64,

    /// Summed conversions.
    pub conversions: u64,

    /// Summed spend.
    pub spend: f64,
}

impl<S: Store> QuotaEngine<S> {
    /// Cumulative counters for one ad.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the ad or its counters are missing.
    pub fn ad_performance(&self, ad_id: &AdId) -> Result<AnalyticsRecord> {
        self.store
            .get_analytics(ad_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "ad",
                id: ad_id.to_string(),
            })
    }

    /// Performance summed across all of the owner's ads. The CTR is
    /// recomputed from the summed counters, not averaged per ad.
    ///
    /// # Errors
    ///
    /// Returns a store error if a read fails.
    pub fn owner_performance(&self, owner: &OwnerRef) -> Result<OwnerPerformance> {
        let ads = self.store.list_ads_by_owner(owner)?;

        let mut perf = OwnerPerformance {
            total_ads: ads.len() as u64,
            active_ads: 0,
            impressions: 0,
            clicks: 0,
            ctr: 0.0,
            reach: 0,
            engagement: 0,
            conversions: 0,
            spend: 0.0,
        };

        for ad in &ads {
            if ad.is_active() {
                perf.active_ads += 1;
            }
            if let Some(analytics) = self.store.get_analytics(&ad.id)? {
                perf.impressions += analytics.impressions;
                perf.clicks += analytics.clicks;
                perf.reach += analytics.reach;
                perf.engagement += analytics.engagement;
                perf.conversions += analytics.conversions;
                perf.spend += analytics.spend;
            }
        }

        perf.ctr = ctr(perf.clicks, perf.impressions);
        Ok(perf)
    }

    /// Daily rollups for an ad over the last `days` UTC days, today included,
    /// chronological order. Days without events produce no row.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] for `days` of 0 or above [`MAX_TREND_DAYS`].
    /// - [`EngineError::NotFound`] if the ad does not exist.
    pub fn daily_trend(&self, ad_id: &AdId, days: u32) -> Result<Vec<DailyRollup>> {
        self.daily_trend_at(ad_id, days, Utc::now())
    }

    pub(crate) fn daily_trend_at(
        &self,
        ad_id: &AdId,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyRollup>> {
        if days == 0 || days > MAX_TREND_DAYS {
            return Err(EngineError::Validation(format!(
                "days must be between 1 and {MAX_TREND_DAYS}"
            )));
        }

        // Existence check so an unknown ad is an error, not an empty trend.
        self.get_ad(ad_id)?;

        let from = date_key(now - Duration::days(i64::from(days) - 1));
        let to = date_key(now);
        Ok(self.store.list_rollups(ad_id, &from, &to)?)
    }

    /// Distinct viewers reached over the last `days` UTC days: the sum of
    /// each day's `unique_reach`. A viewer seen on two days counts twice.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::daily_trend`].
    pub fn unique_reach(&self, ad_id: &AdId, days: u32) -> Result<u64> {
        let trend = self.daily_trend(ad_id, days)?;
        Ok(trend.iter().map(|day| day.unique_reach).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adquota_core::{
        Ad, AdEvent, AdStatus, AdSubscription, OwnerId, OwnerType, PackageId, PlanCatalog,
    };
    use adquota_store::{RecordEventRequest, RocksStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_engine() -> (QuotaEngine<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        (QuotaEngine::new(store, PlanCatalog::default()), dir)
    }

    fn owner() -> OwnerRef {
        OwnerRef::new(OwnerId::generate(), OwnerType::User)
    }

    fn seed(engine: &QuotaEngine<RocksStore>) -> (OwnerRef, Ad) {
        let owner = owner();
        let sub = AdSubscription::new(
            owner,
            PackageId::from("standard"),
            5,
            1000,
            None,
            Utc::now(),
        );
        engine.store().put_subscription(&sub).unwrap();
        let (ad, _) = engine.create_ad(&owner, "Ad").unwrap();
        (owner, ad)
    }

    #[test]
    fn ad_performance_reflects_events() {
        let (engine, _dir) = create_engine();
        let (_, ad) = seed(&engine);

        engine.track_event(&ad.id, AdEvent::Impression, "fp-1").unwrap();
        engine.track_event(&ad.id, AdEvent::Impression, "fp-2").unwrap();
        engine.track_event(&ad.id, AdEvent::Click, "fp-1").unwrap();

        let perf = engine.ad_performance(&ad.id).unwrap();
        assert_eq!(perf.impressions, 2);
        assert_eq!(perf.clicks, 1);
        assert!((perf.ctr - 50.0).abs() < 1e-12);
        assert_eq!(perf.reach, 2);
    }

    #[test]
    fn owner_performance_sums_and_recomputes_ctr() {
        let (engine, _dir) = create_engine();
        let (owner, first) = seed(&engine);
        let (second, _) = engine.create_ad(&owner, "Second").unwrap();

        engine.track_event(&first.id, AdEvent::Impression, "fp-1").unwrap();
        engine.track_event(&second.id, AdEvent::Impression, "fp-1").unwrap();
        engine.track_event(&second.id, AdEvent::Impression, "fp-2").unwrap();
        engine.track_event(&second.id, AdEvent::Click, "fp-1").unwrap();
        engine.track_event(&second.id, AdEvent::Conversion, "fp-1").unwrap();

        engine.set_ad_status(&first.id, AdStatus::Inactive).unwrap();

        let perf = engine.owner_performance(&owner).unwrap();
        assert_eq!(perf.total_ads, 2);
        assert_eq!(perf.active_ads, 1);
        assert_eq!(perf.impressions, 3);
        assert_eq!(perf.clicks, 1);
        assert_eq!(perf.conversions, 1);
        // 1 click over 3 impressions, not an average of per-ad CTRs.
        assert!((perf.ctr - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn owner_with_no_ads_has_zero_performance() {
        let (engine, _dir) = create_engine();
        let perf = engine.owner_performance(&owner()).unwrap();
        assert_eq!(perf.total_ads, 0);
        assert_eq!(perf.ctr, 0.0);
    }

    #[test]
    fn trend_spans_requested_days_in_order() {
        let (engine, _dir) = create_engine();
        let (_, ad) = seed(&engine);

        let now = Utc::now();
        // One impression two days ago, one click today; yesterday is empty.
        let two_days_ago = now - Duration::days(2);
        engine
            .store()
            .record_event(&RecordEventRequest {
                ad_id: ad.id,
                subscription_id: None,
                event: AdEvent::Impression,
                date_key: date_key(two_days_ago),
                fingerprint: "fp-1".into(),
                spend_delta: 0.0,
                now: two_days_ago,
                dedupe_expires_at: two_days_ago + Duration::hours(24),
            })
            .unwrap();
        engine.track_event(&ad.id, AdEvent::Click, "fp-1").unwrap();

        let trend = engine.daily_trend(&ad.id, 7).unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date_key, date_key(two_days_ago));
        assert_eq!(trend[0].impressions, 1);
        assert_eq!(trend[1].date_key, date_key(now));
        assert_eq!(trend[1].clicks, 1);

        // A one-day window only sees today.
        let today_only = engine.daily_trend(&ad.id, 1).unwrap();
        assert_eq!(today_only.len(), 1);
        assert_eq!(today_only[0].date_key, date_key(now));

        // Weekly reach sums the daily unique_reach columns.
        assert_eq!(engine.unique_reach(&ad.id, 7).unwrap(), 1);
        assert_eq!(engine.unique_reach(&ad.id, 1).unwrap(), 0);
    }

    #[test]
    fn trend_bounds_are_validated() {
        let (engine, _dir) = create_engine();
        let (_, ad) = seed(&engine);

        assert!(matches!(
            engine.daily_trend(&ad.id, 0),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.daily_trend(&ad.id, MAX_TREND_DAYS + 1),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.daily_trend(&AdId::generate(), 7),
            Err(EngineError::NotFound { .. })
        ));
    }
}
