//! Client error types.

/// Errors that can occur when using the adquota client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The owner has no active subscription.
    #[error("no active plan for this owner")]
    NoActivePlan,

    /// A plan limit blocked the operation.
    #[error("plan limit reached: {code} ({used}/{limit})")]
    PlanLimit {
        /// Which limit was hit.
        code: String,
        /// Units already consumed.
        used: u64,
        /// The plan ceiling.
        limit: u64,
    },

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
