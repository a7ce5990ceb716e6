//! Adquota Client SDK.
//!
//! This crate provides a client library for services to interact with the adquota API.
//!
//! # Example
//!
//! ```no_run
//! use adquota_client::{AdquotaClient, OwnerIdentity, TrackEvent};
//!
//! # async fn example() -> Result<(), adquota_client::ClientError> {
//! let client = AdquotaClient::new(
//!     "http://adquota.ads-system.svc:8080",
//!     OwnerIdentity::user("5e1f9f6a-7a3b-4f70-9c34-68d9c1b1a1aa"),
//! );
//!
//! // Create an ad against the owner's quota
//! let created = client.create_ad("Spring sale").await?;
//! println!("ad {} uses slot {}/{}", created.ad.id, created.quota.ads_used, created.quota.ad_limit);
//!
//! // Meter a viewer impression
//! let tracked = client
//!     .track_event(&created.ad.id, TrackEvent::Impression, "198.51.100.7", "Mozilla/5.0")
//!     .await?;
//! println!("outcome: {}", tracked.outcome);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{AdquotaClient, ClientOptions, OwnerIdentity};
pub use error::ClientError;
pub use types::*;
