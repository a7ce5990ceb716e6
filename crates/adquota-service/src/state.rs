//! Application state.

use std::sync::Arc;

use adquota_core::PlanCatalog;
use adquota_engine::QuotaEngine;
use adquota_store::RocksStore;

use crate::config::ServiceConfig;
use crate::notifier::LogNotifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The quota engine over the storage backend.
    pub engine: QuotaEngine<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state with the built-in plan catalog.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let engine = QuotaEngine::new(store, PlanCatalog::default())
            .with_notifier(Arc::new(LogNotifier));
        Self { engine, config }
    }
}
