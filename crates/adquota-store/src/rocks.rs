//! `RocksDB` storage implementation.
//!
//! All quota-affecting mutations run inside pessimistic transactions:
//! `get_for_update` locks the subscription key, the condition the caller
//! observed is re-checked against the stored record, and the write commits
//! only if it still holds. This is the compare-and-set primitive the engine
//! relies on; there are no in-process locks.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, MultiThreaded, Options,
    Transaction, TransactionDB, TransactionDBOptions,
};

use adquota_core::{
    Ad, AdEvent, AdId, AdStatus, AdSubscription, AnalyticsRecord, BillingWindow, DailyRollup,
    DedupeRecord, OwnerRef, SubscriptionId, SubscriptionStatus, WebhookEventRecord,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{RecordEventRequest, RecordOutcome, Store};

type Db = TransactionDB<MultiThreaded>;
type Txn<'a> = Transaction<'a, Db>;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<Db>,
}

impl RocksStore {
    /// Open or create a `RocksDB` transaction database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = TransactionDB::open_cf_descriptors(
            &opts,
            &TransactionDBOptions::default(),
            path,
            cf_descriptors,
        )
        .map_err(db_err)?;

        tracing::info!("database opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a value outside any transaction.
    fn read<T: serde::de::DeserializeOwned>(
        &self,
        cf: &Arc<BoundColumnFamily<'_>>,
        key: &[u8],
    ) -> Result<Option<T>> {
        self.db
            .get_cf(cf, key)
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Read a value inside a transaction, taking an exclusive lock on the key.
    fn read_for_update<T: serde::de::DeserializeOwned>(
        txn: &Txn<'_>,
        cf: &Arc<BoundColumnFamily<'_>>,
        key: &[u8],
    ) -> Result<Option<T>> {
        txn.get_for_update_cf(cf, key, true)
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Lock and load a subscription, failing if it does not exist.
    fn subscription_for_update(
        txn: &Txn<'_>,
        cf: &Arc<BoundColumnFamily<'_>>,
        id: &SubscriptionId,
    ) -> Result<AdSubscription> {
        Self::read_for_update(txn, cf, &keys::subscription_key(id))?.ok_or_else(|| {
            StoreError::NotFound {
                entity: "subscription",
                id: id.to_string(),
            }
        })
    }

    /// Write a subscription back inside a transaction and commit.
    fn commit_subscription(
        txn: Txn<'_>,
        cf: &Arc<BoundColumnFamily<'_>>,
        subscription: &AdSubscription,
    ) -> Result<()> {
        let value = Self::serialize(subscription)?;
        txn.put_cf(cf, keys::subscription_key(&subscription.id), value)
            .map_err(db_err)?;
        txn.commit().map_err(db_err)
    }
}

fn db_err(e: rocksdb::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl Store for RocksStore {
    // =========================================================================
    // Subscription Operations
    // =========================================================================

    fn put_subscription(&self, subscription: &AdSubscription) -> Result<()> {
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let cf_by_owner = self.cf(cf::SUBSCRIPTIONS_BY_OWNER)?;

        let value = Self::serialize(subscription)?;
        let txn = self.db.transaction();
        txn.put_cf(&cf_subs, keys::subscription_key(&subscription.id), value)
            .map_err(db_err)?;
        txn.put_cf(
            &cf_by_owner,
            keys::owner_subscription_key(&subscription.owner, &subscription.id),
            [],
        )
        .map_err(db_err)?;
        txn.commit().map_err(db_err)
    }

    fn get_subscription(&self, id: &SubscriptionId) -> Result<Option<AdSubscription>> {
        let cf = self.cf(cf::SUBSCRIPTIONS)?;
        self.read(&cf, &keys::subscription_key(id))
    }

    fn find_active_subscription(
        &self,
        owner: &OwnerRef,
        now: DateTime<Utc>,
    ) -> Result<Option<AdSubscription>> {
        let cf_by_owner = self.cf(cf::SUBSCRIPTIONS_BY_OWNER)?;
        let prefix = keys::owner_prefix(owner);

        let iter = self.db.iterator_cf(
            &cf_by_owner,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        // ULID keys iterate oldest first; keep the newest active match.
        let mut newest = None;
        for item in iter {
            let (key, _) = item.map_err(db_err)?;
            if !key.starts_with(&prefix) {
                break;
            }

            let id = keys::extract_subscription_id(&key);
            if let Some(sub) = self.get_subscription(&id)? {
                if sub.is_active(now) {
                    newest = Some(sub);
                }
            }
        }

        Ok(newest)
    }

    fn advance_period(
        &self,
        id: &SubscriptionId,
        expected_period_end: Option<DateTime<Utc>>,
        window: BillingWindow,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription> {
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let txn = self.db.transaction();

        let mut sub = Self::subscription_for_update(&txn, &cf_subs, id)?;
        if sub.period_end != expected_period_end {
            return Err(StoreError::ConditionFailed);
        }

        sub.apply_window(window, now);
        Self::commit_subscription(txn, &cf_subs, &sub)?;
        Ok(sub)
    }

    fn reserve_ad_slot(
        &self,
        id: &SubscriptionId,
        expected_period_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription> {
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let txn = self.db.transaction();

        let mut sub = Self::subscription_for_update(&txn, &cf_subs, id)?;
        let matches = sub.status == SubscriptionStatus::Active
            && sub.has_slot_capacity()
            && sub.end_date.map_or(true, |end| end > now)
            && sub.period_end == Some(expected_period_end);
        if !matches {
            return Err(StoreError::ConditionFailed);
        }

        sub.ads_used += 1;
        sub.updated_at = now;
        Self::commit_subscription(txn, &cf_subs, &sub)?;
        Ok(sub)
    }

    fn release_ad_slot(&self, id: &SubscriptionId, now: DateTime<Utc>) -> Result<AdSubscription> {
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let txn = self.db.transaction();

        let mut sub = Self::subscription_for_update(&txn, &cf_subs, id)?;
        sub.ads_used = sub.ads_used.saturating_sub(1);
        sub.updated_at = now;
        Self::commit_subscription(txn, &cf_subs, &sub)?;
        Ok(sub)
    }

    fn set_subscription_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription> {
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let txn = self.db.transaction();

        let mut sub = Self::subscription_for_update(&txn, &cf_subs, id)?;
        sub.status = status;
        sub.updated_at = now;
        Self::commit_subscription(txn, &cf_subs, &sub)?;
        Ok(sub)
    }

    fn renew_subscription(
        &self,
        id: &SubscriptionId,
        window: BillingWindow,
        now: DateTime<Utc>,
    ) -> Result<AdSubscription> {
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let txn = self.db.transaction();

        let mut sub = Self::subscription_for_update(&txn, &cf_subs, id)?;
        sub.status = SubscriptionStatus::Active;
        sub.apply_window(window, now);
        Self::commit_subscription(txn, &cf_subs, &sub)?;
        Ok(sub)
    }

    // =========================================================================
    // Ad Operations
    // =========================================================================

    fn put_ad_with_analytics(&self, ad: &Ad, analytics: &AnalyticsRecord) -> Result<()> {
        let cf_ads = self.cf(cf::ADS)?;
        let cf_by_owner = self.cf(cf::ADS_BY_OWNER)?;
        let cf_analytics = self.cf(cf::ANALYTICS)?;

        let ad_value = Self::serialize(ad)?;
        let analytics_value = Self::serialize(analytics)?;

        let txn = self.db.transaction();
        txn.put_cf(&cf_ads, keys::ad_key(&ad.id), ad_value)
            .map_err(db_err)?;
        txn.put_cf(&cf_by_owner, keys::owner_ad_key(&ad.owner, &ad.id), [])
            .map_err(db_err)?;
        txn.put_cf(&cf_analytics, keys::analytics_key(&ad.id), analytics_value)
            .map_err(db_err)?;
        txn.commit().map_err(db_err)
    }

    fn get_ad(&self, id: &AdId) -> Result<Option<Ad>> {
        let cf = self.cf(cf::ADS)?;
        self.read(&cf, &keys::ad_key(id))
    }

    fn set_ad_status(&self, id: &AdId, status: AdStatus, now: DateTime<Utc>) -> Result<Ad> {
        let cf_ads = self.cf(cf::ADS)?;
        let txn = self.db.transaction();

        let mut ad: Ad = Self::read_for_update(&txn, &cf_ads, &keys::ad_key(id))?.ok_or_else(
            || StoreError::NotFound {
                entity: "ad",
                id: id.to_string(),
            },
        )?;

        ad.status = status;
        ad.updated_at = now;
        let value = Self::serialize(&ad)?;
        txn.put_cf(&cf_ads, keys::ad_key(id), value).map_err(db_err)?;
        txn.commit().map_err(db_err)?;
        Ok(ad)
    }

    fn count_active_ads(&self, owner: &OwnerRef) -> Result<u64> {
        let mut count = 0;
        for ad in self.list_ads_by_owner(owner)? {
            if ad.is_active() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn list_ads_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Ad>> {
        let cf_by_owner = self.cf(cf::ADS_BY_OWNER)?;
        let prefix = keys::owner_prefix(owner);

        let iter = self.db.iterator_cf(
            &cf_by_owner,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut ads = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(db_err)?;
            if !key.starts_with(&prefix) {
                break;
            }

            let id = keys::extract_ad_id(&key);
            if let Some(ad) = self.get_ad(&id)? {
                ads.push(ad);
            }
        }

        Ok(ads)
    }

    // =========================================================================
    // Analytics Operations
    // =========================================================================

    fn get_analytics(&self, ad_id: &AdId) -> Result<Option<AnalyticsRecord>> {
        let cf = self.cf(cf::ANALYTICS)?;
        self.read(&cf, &keys::analytics_key(ad_id))
    }

    fn get_rollup(&self, ad_id: &AdId, date_key: &str) -> Result<Option<DailyRollup>> {
        let cf = self.cf(cf::ROLLUPS)?;
        self.read(&cf, &keys::rollup_key(ad_id, date_key))
    }

    fn list_rollups(
        &self,
        ad_id: &AdId,
        from_key: &str,
        to_key: &str,
    ) -> Result<Vec<DailyRollup>> {
        let cf_rollups = self.cf(cf::ROLLUPS)?;
        let prefix = keys::rollup_prefix(ad_id);
        let start = keys::rollup_key(ad_id, from_key);

        let iter = self
            .db
            .iterator_cf(&cf_rollups, IteratorMode::From(&start, Direction::Forward));

        let mut rollups = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(db_err)?;
            if !key.starts_with(&prefix) || key[prefix.len()..] > *to_key.as_bytes() {
                break;
            }
            rollups.push(Self::deserialize(&value)?);
        }

        Ok(rollups)
    }

    fn record_event(&self, request: &RecordEventRequest) -> Result<RecordOutcome> {
        let cf_dedupe = self.cf(cf::DEDUPE)?;
        let cf_analytics = self.cf(cf::ANALYTICS)?;
        let cf_rollups = self.cf(cf::ROLLUPS)?;
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;

        let event_type = request.event.event_type();
        let dedupe_key = keys::dedupe_key(
            &request.ad_id,
            &request.date_key,
            event_type,
            &request.fingerprint,
        );

        let txn = self.db.transaction();

        // Insert-if-absent on the marker; an expired marker counts as absent.
        let existing: Option<DedupeRecord> = Self::read_for_update(&txn, &cf_dedupe, &dedupe_key)?;
        if existing.is_some_and(|marker| marker.is_live(request.now)) {
            return Ok(RecordOutcome::Duplicate);
        }

        let analytics_key = keys::analytics_key(&request.ad_id);
        let mut analytics: AnalyticsRecord =
            Self::read_for_update(&txn, &cf_analytics, &analytics_key)?.ok_or_else(|| {
                StoreError::NotFound {
                    entity: "analytics record",
                    id: request.ad_id.to_string(),
                }
            })?;

        // Impressions meter the subscription; the ceiling is re-checked here,
        // under the key lock, to close the gap left by the advisory pre-check.
        if matches!(request.event, AdEvent::Impression) {
            if let Some(sub_id) = &request.subscription_id {
                let mut sub = Self::subscription_for_update(&txn, &cf_subs, sub_id)?;
                if !sub.has_impression_capacity() {
                    return Err(StoreError::ImpressionLimitExceeded {
                        used: sub.impressions_used,
                        limit: sub.impression_limit,
                    });
                }
                sub.impressions_used += 1;
                sub.updated_at = request.now;
                let value = Self::serialize(&sub)?;
                txn.put_cf(&cf_subs, keys::subscription_key(sub_id), value)
                    .map_err(db_err)?;
            }
        }

        analytics.apply(request.event, request.spend_delta, request.now);
        let analytics_value = Self::serialize(&analytics)?;
        txn.put_cf(&cf_analytics, &analytics_key, analytics_value)
            .map_err(db_err)?;

        let rollup_key = keys::rollup_key(&request.ad_id, &request.date_key);
        let mut rollup: DailyRollup = Self::read_for_update(&txn, &cf_rollups, &rollup_key)?
            .unwrap_or_else(|| DailyRollup::new(request.ad_id, request.date_key.clone()));
        rollup.apply(request.event);
        let rollup_value = Self::serialize(&rollup)?;
        txn.put_cf(&cf_rollups, &rollup_key, rollup_value)
            .map_err(db_err)?;

        let marker = DedupeRecord {
            ad_id: request.ad_id,
            date_key: request.date_key.clone(),
            event_type,
            fingerprint: request.fingerprint.clone(),
            created_at: request.now,
            expires_at: request.dedupe_expires_at,
        };
        let marker_value = Self::serialize(&marker)?;
        txn.put_cf(&cf_dedupe, &dedupe_key, marker_value)
            .map_err(db_err)?;

        txn.commit().map_err(db_err)?;
        Ok(RecordOutcome::Recorded(analytics))
    }

    // =========================================================================
    // Dedup & Webhook Ledger Operations
    // =========================================================================

    fn try_record_webhook_event(&self, event_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let cf_events = self.cf(cf::WEBHOOK_EVENTS)?;
        let key = keys::webhook_event_key(event_id);

        let txn = self.db.transaction();
        let existing: Option<WebhookEventRecord> =
            Self::read_for_update(&txn, &cf_events, &key)?;
        if existing.is_some() {
            return Ok(false);
        }

        let record = WebhookEventRecord {
            event_id: event_id.to_string(),
            received_at: now,
        };
        let value = Self::serialize(&record)?;
        txn.put_cf(&cf_events, &key, value).map_err(db_err)?;
        txn.commit().map_err(db_err)?;
        Ok(true)
    }

    fn purge_expired_dedupe(&self, now: DateTime<Utc>) -> Result<u64> {
        let cf_dedupe = self.cf(cf::DEDUPE)?;

        let mut expired = Vec::new();
        for item in self.db.iterator_cf(&cf_dedupe, IteratorMode::Start) {
            let (key, value) = item.map_err(db_err)?;
            let marker: DedupeRecord = Self::deserialize(&value)?;
            if !marker.is_live(now) {
                expired.push(key);
            }
        }

        let removed = expired.len() as u64;
        for key in expired {
            self.db.delete_cf(&cf_dedupe, key).map_err(db_err)?;
        }

        if removed > 0 {
            tracing::debug!(removed, "purged expired dedup markers");
        }
        Ok(removed)
    }
}
