//! Storage layer for the approval engine
//!
//! Holds tracked articles with their approval records, and role assignments.
//! Backends implement [`ApprovalStore`] and [`RoleDirectory`]; the daemon
//! adds a PostgreSQL backend on top of the same traits.

mod memory;
mod traits;

pub use memory::InMemoryStorage;
pub use traits::{ApprovalStore, RoleDirectory, Storage, StoreError, StoreResult};

use approval_types::ApprovalError;
use std::future::Future;
use std::time::Duration;

impl From<StoreError> for ApprovalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApprovalError::NotFound(msg),
            StoreError::Conflict(msg) => ApprovalError::Conflict(msg),
            StoreError::VersionMismatch { expected, actual } => {
                ApprovalError::VersionConflict { expected, actual }
            }
            StoreError::Connection(msg) => ApprovalError::Unavailable(msg),
            StoreError::Query(msg) => ApprovalError::Internal(format!("store query: {}", msg)),
            StoreError::InvalidData(msg) => {
                ApprovalError::Internal(format!("invalid stored data: {}", msg))
            }
        }
    }
}

/// Run a store call under `limit`, mapping expiry to [`ApprovalError::Timeout`]
pub async fn with_timeout<T, F>(
    limit: Duration,
    op: &'static str,
    fut: F,
) -> Result<T, ApprovalError>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(ApprovalError::from),
        Err(_) => {
            tracing::warn!(op, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(ApprovalError::Timeout(format!(
                "store {} exceeded {}ms",
                op,
                limit.as_millis()
            )))
        }
    }
}
