//! Error types for adquota core.

use crate::ids::IdError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core domain operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The package is not present in the plan catalog.
    #[error("unknown package: {package_id}")]
    UnknownPackage {
        /// The package that was looked up.
        package_id: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Invalid field value supplied at the boundary.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}
