//! Background sweeper for expired dedup markers.
//!
//! Markers are already treated as absent once expired; the sweeper only
//! reclaims the space they occupy.

use std::sync::Arc;
use std::time::Duration;

use adquota_store::{RocksStore, Store};

/// Periodically purge expired dedup markers. Runs until the task is aborted.
pub async fn run_dedupe_sweeper(store: Arc<RocksStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so startup stays fast.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match store.purge_expired_dedupe(chrono::Utc::now()) {
            Ok(removed) => {
                tracing::debug!(removed, "dedup sweep finished");
            }
            Err(e) => {
                tracing::warn!(error = %e, "dedup sweep failed");
            }
        }
    }
}
