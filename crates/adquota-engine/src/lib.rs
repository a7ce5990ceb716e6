//! Quota and billing-period engine.
//!
//! Coordinates plan lookups, billing-window catch-up, ad slot reservation,
//! event metering, and analytics reads on top of the storage layer. The
//! engine holds no locks of its own: every race is settled by the store's
//! conditional updates, and the engine's job is to pick the right condition
//! and to map a lost race to a caller-facing outcome.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analytics;
pub mod billing;
pub mod error;
pub mod meter;
pub mod notify;
pub mod period;
pub mod reserve;

pub use analytics::OwnerPerformance;
pub use billing::{BillingAction, WebhookOutcome};
pub use error::{EngineError, LimitKind, PlanLimitError, Result};
pub use meter::TrackOutcome;
pub use notify::{MetricsNotifier, NoopNotifier};

use std::sync::Arc;

use adquota_core::PlanCatalog;
use adquota_store::Store;

/// The engine. Cheap to clone via the shared store behind `Arc`.
pub struct QuotaEngine<S: Store> {
    pub(crate) store: Arc<S>,
    pub(crate) catalog: PlanCatalog,
    pub(crate) notifier: Arc<dyn MetricsNotifier>,
}

impl<S: Store> Clone for QuotaEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: self.catalog.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S: Store> QuotaEngine<S> {
    /// Create an engine over a store with the given plan catalog.
    pub fn new(store: Arc<S>, catalog: PlanCatalog) -> Self {
        Self {
            store,
            catalog,
            notifier: Arc::new(NoopNotifier),
        }
    }

    /// Replace the metrics notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn MetricsNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The plan catalog.
    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }
}
