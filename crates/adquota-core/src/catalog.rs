//! The plan catalog: static package limits consulted by quota and spend math.
//!
//! The catalog is a pure lookup table with no state or I/O. It is constructed
//! once at the composition root and injected into the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An ad-package identifier (e.g. `"standard"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Create a package identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Limits and price for a single ad package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Maximum impressions per billing period.
    pub impression_limit: u64,

    /// Maximum simultaneously active ads for the owner.
    pub active_ads_limit: u32,

    /// Package price (currency units per billing period).
    pub price: f64,
}

impl PlanLimits {
    /// Flat cost charged per recorded impression.
    ///
    /// Derived as `price / impression_limit`; a package priced at 39 with a
    /// 1000-impression ceiling costs 0.039 per impression.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cost_per_impression(&self) -> f64 {
        if self.impression_limit == 0 {
            0.0
        } else {
            self.price / self.impression_limit as f64
        }
    }
}

/// The static table of ad packages.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    packages: HashMap<PackageId, PlanLimits>,
}

impl PlanCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            packages: HashMap::new(),
        }
    }

    /// Add or replace a package (builder style).
    #[must_use]
    pub fn with_package(mut self, id: impl Into<PackageId>, limits: PlanLimits) -> Self {
        self.packages.insert(id.into(), limits);
        self
    }

    /// Look up a package by identifier.
    #[must_use]
    pub fn get(&self, id: &PackageId) -> Option<&PlanLimits> {
        self.packages.get(id)
    }

    /// Whether the catalog contains the given package.
    #[must_use]
    pub fn contains(&self, id: &PackageId) -> bool {
        self.packages.contains_key(id)
    }

    /// Number of packages in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::empty()
            .with_package(
                "starter",
                PlanLimits {
                    impression_limit: 500,
                    active_ads_limit: 2,
                    price: 19.0,
                },
            )
            .with_package(
                "standard",
                PlanLimits {
                    impression_limit: 1000,
                    active_ads_limit: 5,
                    price: 39.0,
                },
            )
            .with_package(
                "premium",
                PlanLimits {
                    impression_limit: 5000,
                    active_ads_limit: 10,
                    price: 99.0,
                },
            )
            // One-time boost package, sold with a fixed duration
            .with_package(
                "boost",
                PlanLimits {
                    impression_limit: 2500,
                    active_ads_limit: 5,
                    price: 59.0,
                },
            )
    }
}
