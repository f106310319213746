//! Error types for the approval workflow

use crate::gate::Gate;
use crate::role::Role;
use crate::status::ApprovalStatus;
use thiserror::Error;

/// Broad category of a failure, used to pick transport status codes and
/// decide whether a retry makes sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Authorization,
    Validation,
    Conflict,
    State,
    NotFound,
    Infrastructure,
}

/// Errors that can occur in approval workflow operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("Insufficient role: {0}")]
    InsufficientRole(String),

    #[error("Role {role} cannot act at gate {}", gate_label(.current))]
    WrongGate { role: Role, current: Option<Gate> },

    #[error("Gate {0} has already been approved")]
    GateAlreadyApproved(Gate),

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot {action} an article in status {status}")]
    WrongState {
        status: ApprovalStatus,
        action: &'static str,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApprovalError {
    /// Stable machine-readable code exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            ApprovalError::InsufficientRole(_) => "InsufficientRole",
            ApprovalError::WrongGate { .. } => "WrongGate",
            ApprovalError::GateAlreadyApproved(_) => "GateAlreadyApproved",
            ApprovalError::VersionConflict { .. } => "VersionConflict",
            ApprovalError::Validation(_) => "ValidationError",
            ApprovalError::WrongState { .. } => "WrongState",
            ApprovalError::NotFound(_) => "NotFound",
            ApprovalError::Conflict(_) => "Conflict",
            ApprovalError::Timeout(_) => "Timeout",
            ApprovalError::Unavailable(_) => "Unavailable",
            ApprovalError::Internal(_) => "Internal",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApprovalError::InsufficientRole(_) | ApprovalError::WrongGate { .. } => {
                ErrorClass::Authorization
            }
            ApprovalError::Validation(_) => ErrorClass::Validation,
            ApprovalError::GateAlreadyApproved(_)
            | ApprovalError::VersionConflict { .. }
            | ApprovalError::Conflict(_) => ErrorClass::Conflict,
            ApprovalError::WrongState { .. } => ErrorClass::State,
            ApprovalError::NotFound(_) => ErrorClass::NotFound,
            ApprovalError::Timeout(_)
            | ApprovalError::Unavailable(_)
            | ApprovalError::Internal(_) => ErrorClass::Infrastructure,
        }
    }

    /// Only infrastructure failures are worth retrying unchanged; a conflict
    /// needs a fresh read and a new decision first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApprovalError::Timeout(_) | ApprovalError::Unavailable(_)
        )
    }
}

fn gate_label(gate: &Option<Gate>) -> &'static str {
    gate.map(|g| g.key()).unwrap_or("none")
}

/// Result type alias for approval operations
pub type ApprovalResult<T> = Result<T, ApprovalError>;
