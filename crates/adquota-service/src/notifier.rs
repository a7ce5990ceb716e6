//! Tracing-backed metrics notifier.

use adquota_core::{OwnerRef, SubscriptionId};
use adquota_engine::MetricsNotifier;

/// Emits metering outcomes as structured log events. Stands in for a push
/// channel to a metrics pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl MetricsNotifier for LogNotifier {
    fn metrics_changed(&self, owner: &OwnerRef) {
        tracing::debug!(owner = %owner, "analytics updated");
    }

    fn limit_hit(&self, subscription_id: &SubscriptionId, code: &'static str) {
        tracing::warn!(subscription_id = %subscription_id, code, "plan limit hit");
    }
}
