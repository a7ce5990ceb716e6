//! HTTP request handlers.

pub mod ads;
pub mod analytics;
pub mod events;
pub mod health;
pub mod webhooks;
