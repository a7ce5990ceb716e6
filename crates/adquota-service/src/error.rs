//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use adquota_engine::EngineError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed identity headers.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The owner has no active subscription.
    #[error("no active subscription")]
    NoActivePlan,

    /// A plan ceiling was hit.
    #[error("plan limit: {code}")]
    PlanLimit {
        /// Machine-readable limit code.
        code: &'static str,
        /// Units consumed when the check ran.
        used: u64,
        /// The plan's ceiling.
        limit: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::NoActivePlan => (
                StatusCode::FORBIDDEN,
                "no_active_plan",
                self.to_string(),
                None,
            ),
            Self::PlanLimit { code, used, limit } => (
                StatusCode::FORBIDDEN,
                *code,
                self.to_string(),
                Some(serde_json::json!({
                    "used": used,
                    "limit": limit
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => Self::BadRequest(msg),
            EngineError::NotFound { entity, id } => Self::NotFound(format!("{entity}: {id}")),
            EngineError::NoActivePlan { .. } => Self::NoActivePlan,
            EngineError::PlanLimit(limit) => Self::PlanLimit {
                code: limit.kind.as_str(),
                used: limit.used,
                limit: limit.limit,
            },
            EngineError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}
