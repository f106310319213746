//! Error types for approvald

use approval_engine::StoreError;
use approval_types::ApprovalError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed caller identity
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unparseable request (body, query, path or header)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Workflow rule or infrastructure failure
    #[error(transparent)]
    Workflow(#[from] ApprovalError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body: `{ "error": { "code", "message" } }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Workflow(err) => match err {
                ApprovalError::InsufficientRole(_) => StatusCode::FORBIDDEN,
                ApprovalError::WrongGate { .. } => StatusCode::BAD_REQUEST,
                ApprovalError::GateAlreadyApproved(_)
                | ApprovalError::VersionConflict { .. }
                | ApprovalError::Conflict(_) => StatusCode::CONFLICT,
                ApprovalError::Validation(_) | ApprovalError::WrongState { .. } => {
                    StatusCode::BAD_REQUEST
                }
                ApprovalError::NotFound(_) => StatusCode::NOT_FOUND,
                ApprovalError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ApprovalError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ApprovalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "Unauthenticated",
            ApiError::BadRequest(_) => "ValidationError",
            ApiError::Internal(_) => "Internal",
            ApiError::Workflow(err) => err.code(),
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            ApiError::Internal(_) | ApiError::Workflow(ApprovalError::Internal(_))
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_internal() {
            tracing::error!(error = %self, "Request failed with internal error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
