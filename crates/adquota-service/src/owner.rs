//! Owner identity extraction.
//!
//! Identity is resolved by an upstream gateway; owner-scoped requests reach
//! this service with `x-owner-id` (UUID) and `x-owner-type` (`user` or
//! `company`) headers already set.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use adquota_core::{OwnerId, OwnerRef, OwnerType};

use crate::error::ApiError;
use crate::state::AppState;

/// The resolved owner a request acts on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct OwnerIdentity(pub OwnerRef);

impl FromRequestParts<Arc<AppState>> for OwnerIdentity {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let owner_id = header_str(parts, "x-owner-id")?
                .parse::<OwnerId>()
                .map_err(|_| ApiError::BadRequest("invalid x-owner-id".into()))?;

            let owner_type = header_str(parts, "x-owner-type")?
                .parse::<OwnerType>()
                .map_err(|_| ApiError::BadRequest("invalid x-owner-type".into()))?;

            Ok(OwnerIdentity(OwnerRef::new(owner_id, owner_type)))
        })
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)
}
