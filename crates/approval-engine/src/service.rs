//! Workflow service: the entry point used by transports
//!
//! Resolves the caller's effective role, runs the reviewer pre-check, and
//! delegates to the [`TransitionEngine`] and [`QueueResolver`]. Reads go
//! through TTL caches; every committed write invalidates them and publishes
//! an [`ApprovalEventEnvelope`].

use crate::cache::ReadCache;
use crate::config::WorkflowConfig;
use crate::queue::{QueuePage, QueueQuery, QueueResolver};
use crate::store::{with_timeout, Storage};
use crate::transition::{Transition, TransitionEngine, TransitionOutcome};
use approval_types::{
    Actor, ApprovalError, ApprovalEvent, ApprovalEventEnvelope, ApprovalResult, ApprovalStatus,
    Article, ArticleId, Role, RoleAssignment, Severity, TrackedArticle, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Maximum characters in a submitted title
pub const MAX_TITLE_CHARS: usize = 500;

/// Input for registering an article with the workflow
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Caller-chosen id; generated when absent
    pub id: Option<ArticleId>,
    pub title: String,
    pub category: Option<String>,
    pub severity: Option<Severity>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Approval workflow service
#[derive(Clone)]
pub struct WorkflowService {
    storage: Arc<dyn Storage>,
    engine: TransitionEngine,
    resolver: QueueResolver,
    records: Arc<ReadCache<ArticleId, TrackedArticle>>,
    queues: Arc<ReadCache<(Role, QueueQuery), QueuePage>>,
    events: broadcast::Sender<ApprovalEventEnvelope>,
    store_timeout: Duration,
}

impl WorkflowService {
    pub fn new(storage: Arc<dyn Storage>, config: &WorkflowConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            engine: TransitionEngine::new(storage.clone(), config.store_timeout()),
            storage,
            resolver: QueueResolver::new(),
            records: Arc::new(ReadCache::new(config.cache_ttl())),
            queues: Arc::new(ReadCache::new(config.cache_ttl())),
            events,
            store_timeout: config.store_timeout(),
        }
    }

    /// Subscribe to events published after committed writes
    pub fn subscribe(&self) -> broadcast::Receiver<ApprovalEventEnvelope> {
        self.events.subscribe()
    }

    /// The caller with any role-directory assignment applied
    pub async fn effective_actor(&self, caller: Actor) -> ApprovalResult<Actor> {
        let assignment = with_timeout(
            self.store_timeout,
            "get_role",
            self.storage.get_role(&caller.id),
        )
        .await?;
        Ok(match assignment {
            Some(assignment) => caller.with_role(assignment.role),
            None => caller,
        })
    }

    async fn reviewer(&self, caller: Actor) -> ApprovalResult<Actor> {
        let actor = self.effective_actor(caller).await?;
        if !actor.role.is_reviewer() {
            tracing::debug!(actor_id = %actor.id, role = %actor.role, "Caller is not a reviewer");
            return Err(ApprovalError::InsufficientRole(format!(
                "role {} has no access to approvals",
                actor.role
            )));
        }
        Ok(actor)
    }

    /// Register a new article at `pending_marketing`
    pub async fn submit(
        &self,
        caller: Actor,
        submission: Submission,
    ) -> ApprovalResult<TrackedArticle> {
        let actor = self.reviewer(caller).await?;

        let title = submission.title.trim();
        if title.is_empty() {
            return Err(ApprovalError::Validation("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ApprovalError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let tracked = TrackedArticle::submit(Article {
            id: submission.id.unwrap_or_else(ArticleId::generate),
            title: title.to_string(),
            category: submission.category.filter(|c| !c.trim().is_empty()),
            severity: submission.severity,
            created_at: Utc::now(),
            published_at: submission.published_at,
        });
        let article_id = tracked.id();

        with_timeout(
            self.store_timeout,
            "insert",
            self.storage.insert(tracked.clone()),
        )
        .await?;
        self.queues.clear().await;

        tracing::info!(
            article_id = %article_id,
            actor_id = %actor.id,
            "Article submitted for approval"
        );
        self.publish(ApprovalEvent::Submitted { article_id }, actor.id);
        Ok(tracked)
    }

    /// Current approval state of one article
    pub async fn get_status(
        &self,
        caller: Actor,
        article_id: ArticleId,
    ) -> ApprovalResult<TrackedArticle> {
        self.reviewer(caller).await?;
        self.load(article_id).await
    }

    /// Full approval record including history
    pub async fn get_history(
        &self,
        caller: Actor,
        article_id: ArticleId,
    ) -> ApprovalResult<TrackedArticle> {
        self.reviewer(caller).await?;
        self.load(article_id).await
    }

    pub async fn list_queue(
        &self,
        caller: Actor,
        query: QueueQuery,
    ) -> ApprovalResult<QueuePage> {
        let actor = self.effective_actor(caller).await?;
        // Role and input checks run before any store access.
        let target_gate = self.resolver.target_gate(actor.role, query.filters.gate)?;
        query.validate()?;

        let key = (actor.role, query);
        if let Some(page) = self.queues.get(&key).await {
            return Ok(page);
        }

        let generation = self.queues.generation();
        let records = with_timeout(
            self.store_timeout,
            "list_pending",
            self.storage.list_pending(target_gate),
        )
        .await?;
        let page = self.resolver.resolve(actor.role, &key.1, records)?;
        tracing::debug!(
            role = %actor.role,
            total = page.total_items,
            page = page.page,
            "Queue resolved"
        );
        self.queues.insert(generation, key, page.clone()).await;
        Ok(page)
    }

    pub async fn approve(
        &self,
        caller: Actor,
        article_id: ArticleId,
        notes: Option<String>,
        expected_version: Option<u64>,
    ) -> ApprovalResult<TransitionOutcome> {
        self.transition(caller, article_id, Transition::Approve { notes }, expected_version)
            .await
    }

    pub async fn reject(
        &self,
        caller: Actor,
        article_id: ArticleId,
        reason: String,
        expected_version: Option<u64>,
    ) -> ApprovalResult<TransitionOutcome> {
        self.transition(caller, article_id, Transition::Reject { reason }, expected_version)
            .await
    }

    pub async fn release(
        &self,
        caller: Actor,
        article_id: ArticleId,
        expected_version: Option<u64>,
    ) -> ApprovalResult<TransitionOutcome> {
        self.transition(caller, article_id, Transition::Release, expected_version)
            .await
    }

    pub async fn reset(
        &self,
        caller: Actor,
        article_id: ArticleId,
        expected_version: Option<u64>,
    ) -> ApprovalResult<TransitionOutcome> {
        self.transition(caller, article_id, Transition::Reset, expected_version)
            .await
    }

    /// Assign the role named `role` to `user_id`. Only admins may manage
    /// roles and only a super admin may grant `super_admin`. The role name is
    /// parsed after the caller's authority is established.
    pub async fn update_role(
        &self,
        caller: Actor,
        user_id: UserId,
        role: &str,
    ) -> ApprovalResult<RoleAssignment> {
        let actor = self.effective_actor(caller).await?;
        if !actor.role.can_manage_roles() {
            return Err(ApprovalError::InsufficientRole(format!(
                "role {} may not manage roles",
                actor.role
            )));
        }
        let role: Role = role.trim().parse()?;
        if !actor.role.can_grant(role) {
            return Err(ApprovalError::InsufficientRole(format!(
                "role {} may not grant {}",
                actor.role, role
            )));
        }

        let assignment = RoleAssignment {
            user_id,
            role,
            updated_by: actor.id,
            updated_at: Utc::now(),
        };
        with_timeout(
            self.store_timeout,
            "set_role",
            self.storage.set_role(assignment.clone()),
        )
        .await?;

        tracing::info!(user_id = %user_id, role = %role, actor_id = %actor.id, "Role updated");
        self.publish(ApprovalEvent::RoleUpdated { user_id, role }, actor.id);
        Ok(assignment)
    }

    /// Number of records per status; admin only
    pub async fn status_counts(
        &self,
        caller: Actor,
    ) -> ApprovalResult<BTreeMap<ApprovalStatus, u64>> {
        let actor = self.effective_actor(caller).await?;
        if !actor.role.is_admin() {
            return Err(ApprovalError::InsufficientRole(format!(
                "role {} may not view workflow counts",
                actor.role
            )));
        }
        let mut counts = with_timeout(
            self.store_timeout,
            "count_by_status",
            self.storage.count_by_status(),
        )
        .await?;
        for status in ApprovalStatus::all() {
            counts.entry(status).or_insert(0);
        }
        Ok(counts)
    }

    async fn transition(
        &self,
        caller: Actor,
        article_id: ArticleId,
        transition: Transition,
        expected_version: Option<u64>,
    ) -> ApprovalResult<TransitionOutcome> {
        let actor = self.reviewer(caller).await?;
        let verb = transition.verb();

        let result = self
            .engine
            .execute(article_id, actor, transition, expected_version)
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    article_id = %article_id,
                    actor_id = %actor.id,
                    role = %actor.role,
                    action = verb,
                    code = err.code(),
                    error = %err,
                    "Transition refused"
                );
                return Err(err);
            }
        };

        self.records.invalidate(&article_id).await;
        self.queues.clear().await;
        self.publish(outcome.event.clone(), actor.id);
        Ok(outcome)
    }

    async fn load(&self, article_id: ArticleId) -> ApprovalResult<TrackedArticle> {
        if let Some(tracked) = self.records.get(&article_id).await {
            return Ok(tracked);
        }
        let generation = self.records.generation();
        let tracked = with_timeout(self.store_timeout, "get", self.storage.get(&article_id))
            .await?
            .ok_or_else(|| ApprovalError::NotFound(format!("article {}", article_id)))?;
        self.records
            .insert(generation, article_id, tracked.clone())
            .await;
        Ok(tracked)
    }

    fn publish(&self, event: ApprovalEvent, actor: UserId) {
        let name = event.name();
        // No subscribers is not an error.
        if self
            .events
            .send(ApprovalEventEnvelope::new(event, Some(actor)))
            .is_err()
        {
            tracing::trace!(event = name, "No event subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStorage;
    use approval_types::Gate;

    fn service() -> WorkflowService {
        WorkflowService::new(Arc::new(InMemoryStorage::new()), &WorkflowConfig::default())
    }

    fn caller(role: Role) -> Actor {
        Actor::new(UserId::generate(), role)
    }

    fn submission(title: &str) -> Submission {
        Submission {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_and_status() {
        let svc = service();
        let tracked = svc
            .submit(caller(Role::Marketing), submission("  Weekly threat digest "))
            .await
            .unwrap();
        assert_eq!(tracked.article.title, "Weekly threat digest");

        let status = svc.get_status(caller(Role::Ciso), tracked.id()).await.unwrap();
        assert_eq!(status.record.status, ApprovalStatus::Pending(Gate::Marketing));
        assert_eq!(status.record.version, 1);
    }

    #[tokio::test]
    async fn test_submit_validation_and_conflict() {
        let svc = service();
        let err = svc
            .submit(caller(Role::Admin), submission("   "))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let id = ArticleId::generate();
        let with_id = Submission {
            id: Some(id),
            ..submission("Patch Tuesday roundup")
        };
        svc.submit(caller(Role::Admin), with_id.clone()).await.unwrap();
        let err = svc.submit(caller(Role::Admin), with_id).await.unwrap_err();
        assert_eq!(err.code(), "Conflict");
    }

    #[tokio::test]
    async fn test_non_reviewer_refused_before_store() {
        let svc = service();
        let err = svc
            .approve(caller(Role::Viewer), ArticleId::generate(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        let err = svc
            .get_history(caller(Role::Analyst), ArticleId::generate())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");
    }

    #[tokio::test]
    async fn test_unknown_article_is_not_found() {
        let svc = service();
        let err = svc
            .approve(caller(Role::Marketing), ArticleId::generate(), None, Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NotFound");
    }

    #[tokio::test]
    async fn test_transition_without_version_is_refused() {
        let svc = service();
        let mut rx = svc.subscribe();
        let marketing = caller(Role::Marketing);
        let tracked = svc.submit(marketing, submission("Bare")).await.unwrap();
        rx.recv().await.unwrap();

        let err = svc
            .approve(marketing, tracked.id(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let record = svc.get_status(marketing, tracked.id()).await.unwrap().record;
        assert_eq!(record.version, 1);
        assert!(record.history.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_write_invalidates_cached_reads() {
        let svc = service();
        let marketing = caller(Role::Marketing);
        let tracked = svc.submit(marketing, submission("Cached item")).await.unwrap();

        let page = svc.list_queue(marketing, QueueQuery::default()).await.unwrap();
        assert_eq!(page.total_items, 1);
        let before = svc.get_history(marketing, tracked.id()).await.unwrap();
        assert_eq!(before.record.version, 1);

        svc.approve(marketing, tracked.id(), None, Some(1)).await.unwrap();

        let page = svc.list_queue(marketing, QueueQuery::default()).await.unwrap();
        assert_eq!(page.total_items, 0);
        let after = svc.get_history(marketing, tracked.id()).await.unwrap();
        assert_eq!(after.record.version, 2);
        assert_eq!(after.record.history.len(), 1);
    }

    #[tokio::test]
    async fn test_events_published_after_commit() {
        let svc = service();
        let mut rx = svc.subscribe();
        let admin = caller(Role::Admin);
        let tracked = svc.submit(admin, submission("Event check")).await.unwrap();
        svc.approve(admin, tracked.id(), None, Some(1)).await.unwrap();
        let _ = svc
            .approve(caller(Role::Ciso), tracked.id(), None, Some(2))
            .await
            .unwrap_err();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event.name(), "submitted");
        assert_eq!(first.actor, Some(admin.id));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            ApprovalEvent::GateApproved {
                gate: Gate::Marketing,
                ..
            }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_role_directory_overrides_asserted_role() {
        let svc = service();
        let admin = caller(Role::Admin);
        let user = caller(Role::Viewer);

        let err = svc
            .list_queue(user, QueueQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        svc.update_role(admin, user.id, "branding").await.unwrap();
        let page = svc.list_queue(user, QueueQuery::default()).await.unwrap();
        assert_eq!(page.role, Role::Branding);
        assert_eq!(page.target_gate, Some(Gate::Branding));
    }

    #[tokio::test]
    async fn test_update_role_permissions() {
        let svc = service();
        let target = UserId::generate();

        let err = svc
            .update_role(caller(Role::Ciso), target, "marketing")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        // Authority is checked before the role name.
        let err = svc
            .update_role(caller(Role::Ciso), target, "bogus")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        let err = svc
            .update_role(caller(Role::Admin), target, "bogus")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let err = svc
            .update_role(caller(Role::Admin), target, "super_admin")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        let assignment = svc
            .update_role(caller(Role::SuperAdmin), target, "super_admin")
            .await
            .unwrap();
        assert_eq!(assignment.role, Role::SuperAdmin);
    }

    #[tokio::test]
    async fn test_status_counts() {
        let svc = service();
        let admin = caller(Role::Admin);
        for title in ["one", "two"] {
            svc.submit(admin, submission(title)).await.unwrap();
        }
        let counts = svc.status_counts(admin).await.unwrap();
        assert_eq!(counts[&ApprovalStatus::Pending(Gate::Marketing)], 2);
        assert_eq!(counts[&ApprovalStatus::Released], 0);
        assert_eq!(counts.len(), ApprovalStatus::all().len());

        let err = svc.status_counts(caller(Role::Ciso)).await.unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");
    }
}
