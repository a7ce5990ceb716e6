//! Key encoding utilities for `RocksDB`.
//!
//! Owner-scoped index keys start with a 17-byte owner prefix
//! (`owner_tag (1) || owner_uuid (16)`) followed by a 16-byte ULID, so
//! entries for one owner are contiguous and time-ordered.

use adquota_core::{AdId, EventType, OwnerRef, SubscriptionId};

/// Create a subscription key from a subscription ID.
#[must_use]
pub fn subscription_key(id: &SubscriptionId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Create the 17-byte owner prefix used by owner-scoped indexes.
#[must_use]
pub fn owner_prefix(owner: &OwnerRef) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(owner.owner_type.tag());
    key.extend_from_slice(owner.owner_id.as_bytes());
    key
}

/// Create an owner-subscription index key.
///
/// Format: `owner_tag (1) || owner_id (16) || subscription_id (16)`.
#[must_use]
pub fn owner_subscription_key(owner: &OwnerRef, id: &SubscriptionId) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Extract the subscription ID from an owner-subscription index key.
///
/// # Panics
///
/// Panics if the key is not at least 33 bytes.
#[must_use]
pub fn extract_subscription_id(key: &[u8]) -> SubscriptionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[17..33]);
    SubscriptionId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an ad key from an ad ID.
#[must_use]
pub fn ad_key(id: &AdId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Create an owner-ad index key.
///
/// Format: `owner_tag (1) || owner_id (16) || ad_id (16)`.
#[must_use]
pub fn owner_ad_key(owner: &OwnerRef, id: &AdId) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Extract the ad ID from an owner-ad index key.
///
/// # Panics
///
/// Panics if the key is not at least 33 bytes.
#[must_use]
pub fn extract_ad_id(key: &[u8]) -> AdId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[17..33]);
    AdId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an analytics key from an ad ID.
#[must_use]
pub fn analytics_key(id: &AdId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Create a rollup key.
///
/// Format: `ad_id (16) || date_key (10, "YYYY-MM-DD")`. Date keys sort
/// lexicographically in chronological order.
#[must_use]
pub fn rollup_key(id: &AdId, date_key: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + date_key.len());
    key.extend_from_slice(&id.to_bytes());
    key.extend_from_slice(date_key.as_bytes());
    key
}

/// Create the prefix for iterating all rollups of one ad.
#[must_use]
pub fn rollup_prefix(id: &AdId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Create a dedup marker key.
///
/// Format: `ad_id (16) || date_key (10) || event_tag (1) || fingerprint`.
#[must_use]
pub fn dedupe_key(id: &AdId, date_key: &str, event_type: EventType, fingerprint: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + date_key.len() + 1 + fingerprint.len());
    key.extend_from_slice(&id.to_bytes());
    key.extend_from_slice(date_key.as_bytes());
    key.push(event_type.tag());
    key.extend_from_slice(fingerprint.as_bytes());
    key
}

/// Create a webhook-ledger key from an external event ID.
#[must_use]
pub fn webhook_event_key(event_id: &str) -> Vec<u8> {
    event_id.as_bytes().to_vec()
}
