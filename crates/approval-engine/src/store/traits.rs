//! Storage trait definitions

use approval_types::{
    ApprovalRecord, ApprovalStatus, ArticleId, Gate, RoleAssignment, TrackedArticle, UserId,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Version mismatch: expected {expected}, found {actual}")]
    VersionMismatch { expected: u64, actual: u64 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Combined storage trait
#[async_trait]
pub trait Storage: ApprovalStore + RoleDirectory + Send + Sync {}

/// Persistence for tracked articles and their approval records
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Insert a newly submitted article; fails with `Conflict` if the id exists
    async fn insert(&self, tracked: TrackedArticle) -> StoreResult<()>;

    /// Get a tracked article by ID
    async fn get(&self, id: &ArticleId) -> StoreResult<Option<TrackedArticle>>;

    /// List every tracked article
    async fn list(&self) -> StoreResult<Vec<TrackedArticle>>;

    /// Articles waiting at `gate`, or at any gate when `gate` is `None`.
    /// Approved, rejected and released articles are never returned.
    async fn list_pending(&self, gate: Option<Gate>) -> StoreResult<Vec<TrackedArticle>>;

    /// Replace the approval record only if the stored version still equals
    /// `expected_version`. The comparison and the write are one atomic step.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: ApprovalRecord,
    ) -> StoreResult<()>;

    /// Number of records per status
    async fn count_by_status(&self) -> StoreResult<BTreeMap<ApprovalStatus, u64>> {
        let mut counts = BTreeMap::new();
        for tracked in self.list().await? {
            *counts.entry(tracked.record.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Role assignments that override the role asserted by the auth layer
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn get_role(&self, user_id: &UserId) -> StoreResult<Option<RoleAssignment>>;

    /// Create or replace the assignment for `assignment.user_id`
    async fn set_role(&self, assignment: RoleAssignment) -> StoreResult<()>;
}
