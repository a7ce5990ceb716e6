//! Engine error types.

use adquota_store::StoreError;

/// Which plan ceiling was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// The owner already has as many active ads as the plan allows.
    ActiveAdLimitReached,

    /// All ad slots for the current billing period are used.
    AdLimitReached,

    /// The impression quota for the current billing period is exhausted.
    ImpressionLimitReached,
}

impl LimitKind {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveAdLimitReached => "active_ad_limit_reached",
            Self::AdLimitReached => "ad_limit_reached",
            Self::ImpressionLimitReached => "impression_limit_reached",
        }
    }
}

/// A plan ceiling was hit; carries the usage figures for the error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimitError {
    /// Which ceiling.
    pub kind: LimitKind,

    /// Units consumed when the check ran.
    pub used: u64,

    /// The plan's ceiling.
    pub limit: u64,
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A request value failed validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity.
        entity: &'static str,
        /// The entity's ID.
        id: String,
    },

    /// The owner has no active subscription.
    #[error("no active subscription for owner {owner}")]
    NoActivePlan {
        /// The owner reference, as `type:id`.
        owner: String,
    },

    /// A plan ceiling was hit.
    #[error("{} ({}/{})", .0.kind.as_str(), .0.used, .0.limit)]
    PlanLimit(PlanLimitError),

    /// The storage layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Shorthand for a [`EngineError::PlanLimit`].
    #[must_use]
    pub const fn limit(kind: LimitKind, used: u64, limit: u64) -> Self {
        Self::PlanLimit(PlanLimitError { kind, used, limit })
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
