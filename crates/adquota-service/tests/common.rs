//! Common test utilities for adquota integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use adquota_core::{AdSubscription, OwnerId, OwnerRef, OwnerType, PackageId, PlanCatalog};
use adquota_engine::QuotaEngine;
use adquota_service::{create_router, crypto, AppState, ServiceConfig};
use adquota_store::{RocksStore, Store};

/// Shared webhook secret used by the harness configuration.
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Direct store handle for seeding records.
    pub store: Arc<RocksStore>,
    /// Engine over the same store, for seeding through the real flows.
    pub engine: QuotaEngine<RocksStore>,
    /// A test owner for identified requests.
    pub owner: OwnerRef,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.into()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            dedupe_sweep_interval_seconds: 3600,
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        let engine = QuotaEngine::new(Arc::clone(&store), PlanCatalog::default());
        let owner = OwnerRef::new(OwnerId::generate(), OwnerType::User);

        Self {
            server,
            _temp_dir: temp_dir,
            store,
            engine,
            owner,
        }
    }

    /// Give the harness owner a subscription on the named package.
    pub fn seed_subscription(&self, package: &str) -> AdSubscription {
        self.engine
            .create_subscription(self.owner, &PackageId::from(package), None, None)
            .expect("Failed to seed subscription")
    }

    /// Give the harness owner a subscription with explicit limits.
    pub fn seed_subscription_with_limits(
        &self,
        ad_limit: u32,
        impression_limit: u64,
    ) -> AdSubscription {
        let sub = AdSubscription::new(
            self.owner,
            PackageId::from("standard"),
            ad_limit,
            impression_limit,
            None,
            chrono::Utc::now(),
        );
        self.store
            .put_subscription(&sub)
            .expect("Failed to seed subscription");
        sub
    }

    /// Identity headers for the harness owner.
    pub fn owner_id_header(&self) -> String {
        self.owner.owner_id.to_string()
    }

    /// The harness owner's type header value.
    pub fn owner_type_header(&self) -> &'static str {
        self.owner.owner_type.as_str()
    }

    /// Sign a webhook body with the harness secret.
    pub fn sign_webhook(body: &str) -> String {
        crypto::hmac_sha256_hex(WEBHOOK_SECRET, body)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
