//! Hook for pushing metering outcomes to an external sink.

use adquota_core::{OwnerRef, SubscriptionId};

/// Receives notifications after metering decisions. Implementations must not
/// block; the engine calls these synchronously on the request path.
pub trait MetricsNotifier: Send + Sync {
    /// An owner's analytics counters changed.
    fn metrics_changed(&self, owner: &OwnerRef);

    /// A quota check rejected work on a subscription.
    fn limit_hit(&self, subscription_id: &SubscriptionId, code: &'static str);
}

/// A notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl MetricsNotifier for NoopNotifier {
    fn metrics_changed(&self, _owner: &OwnerRef) {}

    fn limit_hit(&self, _subscription_id: &SubscriptionId, _code: &'static str) {}
}
