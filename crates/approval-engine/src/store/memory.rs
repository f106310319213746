//! In-memory storage implementation

use super::traits::*;
use approval_types::{ApprovalRecord, ArticleId, Gate, RoleAssignment, TrackedArticle, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    articles: Arc<RwLock<HashMap<ArticleId, TrackedArticle>>>,
    roles: Arc<RwLock<HashMap<UserId, RoleAssignment>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalStore for InMemoryStorage {
    async fn insert(&self, tracked: TrackedArticle) -> StoreResult<()> {
        let mut articles = self.articles.write().await;
        let id = tracked.id();
        if articles.contains_key(&id) {
            return Err(StoreError::Conflict(format!("article {}", id)));
        }
        articles.insert(id, tracked);
        Ok(())
    }

    async fn get(&self, id: &ArticleId) -> StoreResult<Option<TrackedArticle>> {
        let articles = self.articles.read().await;
        Ok(articles.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<TrackedArticle>> {
        let articles = self.articles.read().await;
        Ok(articles.values().cloned().collect())
    }

    async fn list_pending(&self, gate: Option<Gate>) -> StoreResult<Vec<TrackedArticle>> {
        let articles = self.articles.read().await;
        Ok(articles
            .values()
            .filter(|tracked| match (tracked.record.current_gate(), gate) {
                (Some(current), Some(wanted)) => current == wanted,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .cloned()
            .collect())
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: ApprovalRecord,
    ) -> StoreResult<()> {
        let mut articles = self.articles.write().await;
        let tracked = articles
            .get_mut(&record.article_id)
            .ok_or_else(|| StoreError::NotFound(format!("article {}", record.article_id)))?;

        if tracked.record.version != expected_version {
            return Err(StoreError::VersionMismatch {
                expected: expected_version,
                actual: tracked.record.version,
            });
        }

        tracked.record = record;
        Ok(())
    }
}

#[async_trait]
impl RoleDirectory for InMemoryStorage {
    async fn get_role(&self, user_id: &UserId) -> StoreResult<Option<RoleAssignment>> {
        let roles = self.roles.read().await;
        Ok(roles.get(user_id).cloned())
    }

    async fn set_role(&self, assignment: RoleAssignment) -> StoreResult<()> {
        let mut roles = self.roles.write().await;
        roles.insert(assignment.user_id, assignment);
        Ok(())
    }
}

impl Storage for InMemoryStorage {}
