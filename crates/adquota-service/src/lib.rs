//! AdQuota HTTP API Service.
//!
//! This crate provides the HTTP API for the adquota campaign engine:
//!
//! - Ad creation and activation against subscription quotas
//! - Viewer event ingestion with per-day deduplication
//! - Per-ad and campaign-wide analytics
//! - Inbound billing webhooks (signed, idempotent)
//!
//! # Identity
//!
//! The service sits behind a gateway that resolves identity; owner-scoped
//! requests carry pre-resolved `x-owner-id` and `x-owner-type` headers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for the router

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod owner;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use notifier::LogNotifier;
pub use owner::OwnerIdentity;
pub use routes::create_router;
pub use state::AppState;
pub use sweeper::run_dedupe_sweeper;
