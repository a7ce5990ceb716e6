//! Ad creation and the ad-slot reservation flow.
//!
//! Creating an ad is a two-phase write: the slot is reserved on the
//! subscription first (the only step that can lose a race), then the ad and
//! its analytics record are persisted. If the second phase fails, the
//! reservation is compensated by a guarded release.

use chrono::{DateTime, Utc};

use adquota_core::{Ad, AdId, AdStatus, AdSubscription, AnalyticsRecord, OwnerRef};
use adquota_store::{Store, StoreError};

use crate::error::{EngineError, LimitKind, Result};
use crate::QuotaEngine;

impl<S: Store> QuotaEngine<S> {
    /// Create an ad for the owner, consuming one ad slot on their active
    /// subscription for the current billing period.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] for an empty title.
    /// - [`EngineError::NoActivePlan`] if the owner has no active subscription.
    /// - [`EngineError::PlanLimit`] when an ad ceiling is hit.
    pub fn create_ad(&self, owner: &OwnerRef, title: &str) -> Result<(Ad, AdSubscription)> {
        self.create_ad_at(owner, title, Utc::now())
    }

    pub(crate) fn create_ad_at(
        &self,
        owner: &OwnerRef,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<(Ad, AdSubscription)> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::Validation("title must not be empty".into()));
        }

        let subscription = self.current_subscription(owner)?;
        let subscription = self.ensure_current_period_at(subscription, now)?;

        // Advisory checks with current figures. The authoritative slot
        // check happens in the conditional reservation below.
        let active_ads_limit = self
            .catalog
            .get(&subscription.package_id)
            .map_or(subscription.ad_limit, |limits| limits.active_ads_limit);
        let active = self.store.count_active_ads(owner)?;
        if active >= u64::from(active_ads_limit) {
            self.notifier
                .limit_hit(&subscription.id, LimitKind::ActiveAdLimitReached.as_str());
            return Err(EngineError::limit(
                LimitKind::ActiveAdLimitReached,
                active,
                u64::from(active_ads_limit),
            ));
        }
        if subscription.impressions_used >= subscription.impression_limit {
            self.notifier
                .limit_hit(&subscription.id, LimitKind::ImpressionLimitReached.as_str());
            return Err(EngineError::limit(
                LimitKind::ImpressionLimitReached,
                subscription.impressions_used,
                subscription.impression_limit,
            ));
        }
        if subscription.ads_used >= subscription.ad_limit {
            self.notifier
                .limit_hit(&subscription.id, LimitKind::AdLimitReached.as_str());
            return Err(EngineError::limit(
                LimitKind::AdLimitReached,
                u64::from(subscription.ads_used),
                u64::from(subscription.ad_limit),
            ));
        }

        let period_end = subscription.period_end.ok_or_else(|| {
            EngineError::Validation("subscription has no billing window".into())
        })?;

        let subscription = match self.store.reserve_ad_slot(&subscription.id, period_end, now) {
            Ok(sub) => sub,
            Err(StoreError::ConditionFailed) => {
                // Lost the race or the slots ran out; report current figures.
                let current = self
                    .store
                    .get_subscription(&subscription.id)?
                    .unwrap_or(subscription);
                self.notifier
                    .limit_hit(&current.id, LimitKind::AdLimitReached.as_str());
                return Err(EngineError::limit(
                    LimitKind::AdLimitReached,
                    u64::from(current.ads_used),
                    u64::from(current.ad_limit),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let ad = Ad::new(*owner, title.to_string(), now);
        let analytics = AnalyticsRecord::new(ad.id, now);
        if let Err(e) = self.store.put_ad_with_analytics(&ad, &analytics) {
            // Compensate the reservation so the slot is not leaked.
            if let Err(release_err) = self.store.release_ad_slot(&subscription.id, now) {
                tracing::error!(
                    subscription_id = %subscription.id,
                    error = %release_err,
                    "failed to release reserved ad slot; quota may leak until next rollover"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            ad_id = %ad.id,
            owner = %owner,
            ads_used = subscription.ads_used,
            ad_limit = subscription.ad_limit,
            "ad created"
        );
        Ok((ad, subscription))
    }

    /// Fetch an ad.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the ad does not exist.
    pub fn get_ad(&self, id: &AdId) -> Result<Ad> {
        self.store.get_ad(id)?.ok_or_else(|| EngineError::NotFound {
            entity: "ad",
            id: id.to_string(),
        })
    }

    /// Change an ad's serving status. Deactivating an ad does not return its
    /// slot; slots are only freed by the period rollover.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the ad does not exist.
    pub fn set_ad_status(&self, id: &AdId, status: AdStatus) -> Result<Ad> {
        match self.store.set_ad_status(id, status, Utc::now()) {
            Ok(ad) => Ok(ad),
            Err(StoreError::NotFound { entity, id }) => {
                Err(EngineError::NotFound { entity, id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List the owner's ads, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the listing fails.
    pub fn list_ads(&self, owner: &OwnerRef) -> Result<Vec<Ad>> {
        Ok(self.store.list_ads_by_owner(owner)?)
    }
}
