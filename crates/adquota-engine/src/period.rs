//! Billing-period refresh.
//!
//! A subscription's window is only brought current lazily, at the moment a
//! quota decision needs it. Concurrent refreshers race on the store's
//! `period_end` token; exactly one wins the transition and resets the usage
//! counters, the rest adopt the winner's record.

use chrono::{DateTime, Utc};

use adquota_core::{catch_up, AdSubscription, OwnerRef};
use adquota_store::{Store, StoreError};

use crate::error::{EngineError, Result};
use crate::QuotaEngine;

impl<S: Store> QuotaEngine<S> {
    /// Look up the owner's active subscription.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoActivePlan`] if the owner has none.
    pub fn current_subscription(&self, owner: &OwnerRef) -> Result<AdSubscription> {
        self.store
            .find_active_subscription(owner, Utc::now())?
            .ok_or_else(|| EngineError::NoActivePlan {
                owner: owner.to_string(),
            })
    }

    /// Bring the subscription's billing window current, resetting usage
    /// counters if a rollover is due. Returns the up-to-date record.
    ///
    /// Losing the rollover race is not an error: the loser re-reads and
    /// returns the winner's state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the subscription vanished, or a
    /// store error.
    pub fn ensure_current_period(&self, subscription: AdSubscription) -> Result<AdSubscription> {
        self.ensure_current_period_at(subscription, Utc::now())
    }

    pub(crate) fn ensure_current_period_at(
        &self,
        subscription: AdSubscription,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription> {
        let Some(window) = catch_up(
            subscription.period_start,
            subscription.period_end,
            subscription.start_date,
            now,
        ) else {
            return Ok(subscription);
        };

        match self
            .store
            .advance_period(&subscription.id, subscription.period_end, window, now)
        {
            Ok(advanced) => {
                tracing::info!(
                    subscription_id = %advanced.id,
                    period_start = %window.start,
                    period_end = %window.end,
                    "billing period advanced"
                );
                Ok(advanced)
            }
            // Someone else advanced it first; their window stands.
            Err(StoreError::ConditionFailed) => self
                .store
                .get_subscription(&subscription.id)?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "subscription",
                    id: subscription.id.to_string(),
                }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adquota_core::{OwnerId, OwnerType, PackageId, SubscriptionStatus};
    use adquota_store::RocksStore;
    use chrono::Duration;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_engine() -> (QuotaEngine<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        (QuotaEngine::new(store, adquota_core::PlanCatalog::default()), dir)
    }

    fn owner() -> OwnerRef {
        OwnerRef::new(OwnerId::generate(), OwnerType::User)
    }

    fn seed_subscription(engine: &QuotaEngine<RocksStore>, owner: OwnerRef) -> AdSubscription {
        let sub = AdSubscription::new(owner, PackageId::from("standard"), 5, 1000, None, Utc::now());
        engine.store().put_subscription(&sub).unwrap();
        sub
    }

    #[test]
    fn current_window_needs_no_refresh() {
        let (engine, _dir) = create_engine();
        let sub = seed_subscription(&engine, owner());

        let refreshed = engine.ensure_current_period(sub.clone()).unwrap();
        assert_eq!(refreshed.period_end, sub.period_end);
    }

    #[test]
    fn stale_window_rolls_over_and_resets_usage() {
        let (engine, _dir) = create_engine();
        let mut sub = seed_subscription(&engine, owner());

        // Age the record: window ended a week ago, with usage on the books.
        let now = Utc::now();
        sub.period_start = Some(now - Duration::days(37));
        sub.period_end = Some(now - Duration::days(7));
        sub.ads_used = 3;
        sub.impressions_used = 800;
        engine.store().put_subscription(&sub).unwrap();

        let refreshed = engine.ensure_current_period(sub).unwrap();
        assert_eq!(refreshed.ads_used, 0);
        assert_eq!(refreshed.impressions_used, 0);
        assert!(refreshed.period_end.unwrap() > now);
        assert!(refreshed.period_start.unwrap() <= now);
    }

    #[test]
    fn lost_race_adopts_winner_state() {
        let (engine, _dir) = create_engine();
        let mut sub = seed_subscription(&engine, owner());

        let now = Utc::now();
        sub.period_start = Some(now - Duration::days(60));
        sub.period_end = Some(now - Duration::days(30));
        engine.store().put_subscription(&sub).unwrap();

        // First refresh wins the CAS; replaying the same stale snapshot
        // simulates a concurrent loser.
        let winner = engine.ensure_current_period_at(sub.clone(), now).unwrap();
        let loser = engine.ensure_current_period_at(sub, now).unwrap();
        assert_eq!(loser.period_end, winner.period_end);
    }

    #[test]
    fn no_active_plan_is_reported() {
        let (engine, _dir) = create_engine();
        let owner = owner();

        let err = engine.current_subscription(&owner).unwrap_err();
        assert!(matches!(err, EngineError::NoActivePlan { .. }));

        let sub = seed_subscription(&engine, owner);
        engine
            .store()
            .set_subscription_status(&sub.id, SubscriptionStatus::Cancelled, Utc::now())
            .unwrap();
        assert!(matches!(
            engine.current_subscription(&owner),
            Err(EngineError::NoActivePlan { .. })
        ));
    }
}
