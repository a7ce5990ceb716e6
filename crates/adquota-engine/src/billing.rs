//! Subscription lifecycle and the inbound billing-webhook flow.

use chrono::Utc;

use adquota_core::{
    AdSubscription, BillingWindow, OwnerRef, PackageId, SubscriptionId, SubscriptionStatus,
};
use adquota_store::{Store, StoreError};

use crate::error::{EngineError, Result};
use crate::QuotaEngine;

/// A subscription mutation carried by a billing webhook.
#[derive(Debug, Clone)]
pub enum BillingAction {
    /// A purchase cleared upstream; provision a subscription.
    Create {
        /// The purchasing owner.
        owner: OwnerRef,
        /// The purchased plan.
        package_id: PackageId,
        /// Optional override of the plan's ad ceiling.
        ad_limit: Option<u32>,
        /// One-time packages end after this many days.
        duration_days: Option<i64>,
    },

    /// A renewal payment cleared; open a fresh period with reset counters.
    Renew(SubscriptionId),

    /// The subscription was cancelled upstream.
    Cancel(SubscriptionId),

    /// The subscription lapsed upstream.
    Expire(SubscriptionId),
}

/// Outcome of processing one webhook delivery.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// First delivery; the action was applied.
    Applied(AdSubscription),

    /// The event ID was seen before; nothing was changed.
    AlreadyProcessed,
}

impl<S: Store> QuotaEngine<S> {
    /// Create a subscription for the owner on the given plan. `ad_limit`
    /// overrides the catalog's ad ceiling when given; `duration_days` makes
    /// this a one-time package that ends after that many days.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for an unknown package or a zero
    /// duration.
    pub fn create_subscription(
        &self,
        owner: OwnerRef,
        package_id: &PackageId,
        ad_limit: Option<u32>,
        duration_days: Option<i64>,
    ) -> Result<AdSubscription> {
        let limits = self.catalog.get(package_id).ok_or_else(|| {
            EngineError::Validation(format!("unknown package: {package_id}"))
        })?;
        if duration_days.is_some_and(|days| days <= 0) {
            return Err(EngineError::Validation(
                "duration_days must be positive".into(),
            ));
        }

        let now = Utc::now();
        let end_date = duration_days.map(|days| now + chrono::Duration::days(days));
        let subscription = AdSubscription::new(
            owner,
            package_id.clone(),
            ad_limit.unwrap_or(limits.active_ads_limit),
            limits.impression_limit,
            end_date,
            now,
        );
        self.store.put_subscription(&subscription)?;

        tracing::info!(
            subscription_id = %subscription.id,
            owner = %owner,
            package = %package_id,
            "subscription created"
        );
        Ok(subscription)
    }

    /// Fetch a subscription.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if it does not exist.
    pub fn get_subscription(&self, id: &SubscriptionId) -> Result<AdSubscription> {
        self.store
            .get_subscription(id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "subscription",
                id: id.to_string(),
            })
    }

    /// Apply a billing action exactly once per webhook `event_id`.
    /// Redeliveries are acknowledged without re-applying the mutation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the targeted subscription does
    /// not exist (the event ID is still recorded, so a retry with the same
    /// ID stays a no-op).
    pub fn apply_billing_event(
        &self,
        event_id: &str,
        action: &BillingAction,
    ) -> Result<WebhookOutcome> {
        let now = Utc::now();
        if !self.store.try_record_webhook_event(event_id, now)? {
            tracing::debug!(event_id, "webhook redelivery ignored");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let result = match action {
            BillingAction::Create {
                owner,
                package_id,
                ad_limit,
                duration_days,
            } => {
                let created =
                    self.create_subscription(*owner, package_id, *ad_limit, *duration_days)?;
                return Ok(WebhookOutcome::Applied(created));
            }
            BillingAction::Renew(id) => {
                self.store
                    .renew_subscription(id, BillingWindow::monthly_from(now), now)
            }
            BillingAction::Cancel(id) => {
                self.store
                    .set_subscription_status(id, SubscriptionStatus::Cancelled, now)
            }
            BillingAction::Expire(id) => {
                self.store
                    .set_subscription_status(id, SubscriptionStatus::Expired, now)
            }
        };

        match result {
            Ok(subscription) => {
                tracing::info!(
                    event_id,
                    subscription_id = %subscription.id,
                    status = subscription.status.as_str(),
                    "billing event applied"
                );
                Ok(WebhookOutcome::Applied(subscription))
            }
            Err(StoreError::NotFound { entity, id }) => Err(EngineError::NotFound { entity, id }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adquota_core::{OwnerId, OwnerType, PlanCatalog};
    use adquota_store::RocksStore;
    use chrono::Duration;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_engine() -> (QuotaEngine<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        (QuotaEngine::new(store, PlanCatalog::default()), dir)
    }

    fn owner() -> OwnerRef {
        OwnerRef::new(OwnerId::generate(), OwnerType::Company)
    }

    #[test]
    fn subscription_gets_plan_limits() {
        let (engine, _dir) = create_engine();
        let sub = engine
            .create_subscription(owner(), &PackageId::from("premium"), None, None)
            .unwrap();
        assert_eq!(sub.ad_limit, 10);
        assert_eq!(sub.impression_limit, 5000);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.period_end.is_some());
    }

    #[test]
    fn unknown_package_is_rejected() {
        let (engine, _dir) = create_engine();
        let err = engine
            .create_subscription(owner(), &PackageId::from("platinum"), None, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn renewal_resets_usage_and_reactivates() {
        let (engine, _dir) = create_engine();
        let mut sub = engine
            .create_subscription(owner(), &PackageId::from("starter"), None, None)
            .unwrap();

        sub.ads_used = 2;
        sub.impressions_used = 400;
        sub.status = SubscriptionStatus::Expired;
        engine.store().put_subscription(&sub).unwrap();

        let outcome = engine
            .apply_billing_event("evt_renew_1", &BillingAction::Renew(sub.id))
            .unwrap();
        let WebhookOutcome::Applied(renewed) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(renewed.status, SubscriptionStatus::Active);
        assert_eq!(renewed.ads_used, 0);
        assert_eq!(renewed.impressions_used, 0);
        assert!(renewed.period_end.unwrap() > Utc::now());
    }

    #[test]
    fn purchase_event_provisions_a_subscription() {
        let (engine, _dir) = create_engine();
        let owner = owner();

        let outcome = engine
            .apply_billing_event(
                "evt_purchase_1",
                &BillingAction::Create {
                    owner,
                    package_id: PackageId::from("standard"),
                    ad_limit: None,
                    duration_days: None,
                },
            )
            .unwrap();
        let WebhookOutcome::Applied(sub) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(sub.impression_limit, 1000);
        assert!(engine.current_subscription(&owner).is_ok());
    }

    #[test]
    fn redelivery_applies_nothing() {
        let (engine, _dir) = create_engine();
        let sub = engine
            .create_subscription(owner(), &PackageId::from("starter"), None, None)
            .unwrap();

        engine
            .apply_billing_event("evt_1", &BillingAction::Cancel(sub.id))
            .unwrap();

        // The replayed cancel is swallowed, and a different action under the
        // same event ID is swallowed too.
        let replay = engine
            .apply_billing_event("evt_1", &BillingAction::Renew(sub.id))
            .unwrap();
        assert!(matches!(replay, WebhookOutcome::AlreadyProcessed));

        let stored = engine.store().get_subscription(&sub.id).unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Cancelled);
    }

    #[test]
    fn cancel_and_expire_set_status() {
        let (engine, _dir) = create_engine();
        let sub = engine
            .create_subscription(owner(), &PackageId::from("boost"), None, None)
            .unwrap();

        engine
            .apply_billing_event("evt_cancel", &BillingAction::Cancel(sub.id))
            .unwrap();
        let stored = engine.store().get_subscription(&sub.id).unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Cancelled);

        engine
            .apply_billing_event("evt_expire", &BillingAction::Expire(sub.id))
            .unwrap();
        let stored = engine.store().get_subscription(&sub.id).unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);
    }

    #[test]
    fn one_time_package_gets_an_end_date() {
        let (engine, _dir) = create_engine();
        let sub = engine
            .create_subscription(owner(), &PackageId::from("boost"), Some(3), Some(7))
            .unwrap();
        assert_eq!(sub.ad_limit, 3);
        let end = sub.end_date.unwrap();
        assert!(end > Utc::now() + Duration::days(6));
        assert!(end < Utc::now() + Duration::days(8));

        assert!(matches!(
            engine.create_subscription(owner(), &PackageId::from("boost"), None, Some(0)),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn ended_subscription_is_not_current() {
        let (engine, _dir) = create_engine();
        let owner = owner();
        let mut sub = engine
            .create_subscription(owner, &PackageId::from("starter"), None, Some(30))
            .unwrap();

        sub.end_date = Some(Utc::now() - Duration::days(1));
        engine.store().put_subscription(&sub).unwrap();

        assert!(matches!(
            engine.current_subscription(&owner),
            Err(EngineError::NoActivePlan { .. })
        ));
    }
}
