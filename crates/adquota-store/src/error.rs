//! Error types for adquota storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind that was looked up.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A conditional update matched nothing: the stored record no longer
    /// satisfies the condition the caller observed. A concurrent caller won.
    #[error("conditional update matched nothing")]
    ConditionFailed,

    /// The impression ceiling was hit inside the recording transaction.
    #[error("impression limit exceeded: used={used}, limit={limit}")]
    ImpressionLimitExceeded {
        /// Impressions consumed this period.
        used: u64,
        /// The period's impression ceiling.
        limit: u64,
    },
}
