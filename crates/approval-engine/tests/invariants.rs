//! Property tests: random action sequences never break record invariants.

use approval_engine::{
    plan, ApprovalStore, GateRegistry, InMemoryStorage, RoleDirectory, Storage, StoreResult,
    Submission, Transition, WorkflowConfig, WorkflowService,
};
use approval_types::{
    Actor, ApprovalRecord, ApprovalStatus, ArticleId, Gate, Role, RoleAssignment, TrackedArticle,
    UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn arb_transition() -> impl Strategy<Value = Transition> {
    prop_oneof![
        4 => Just(Transition::Approve { notes: None }),
        1 => "[a-z ]{0,30}".prop_map(|reason| Transition::Reject { reason }),
        1 => Just(Transition::Release),
        1 => Just(Transition::Reset),
    ]
}

fn arb_step() -> impl Strategy<Value = (Role, Transition, bool)> {
    (arb_role(), arb_transition(), any::<bool>())
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Completed gates stay an ordered prefix, never duplicate, and every
    /// accepted step bumps the version by exactly one.
    #[test]
    fn invariants_hold_over_random_sequences(steps in prop::collection::vec(arb_step(), 1..60)) {
        let registry = GateRegistry::new();
        let mut record = ApprovalRecord::new(ArticleId::generate(), Utc::now());

        for (role, transition, stale) in steps {
            let actor = Actor::new(UserId::generate(), role);
            let expected = if stale { record.version - 1 } else { record.version };

            if let Ok(next) = plan(&registry, &record, actor, &transition, expected, Utc::now()) {
                prop_assert!(!stale);
                prop_assert_eq!(next.version, record.version + 1);
                prop_assert_eq!(next.history.len(), record.history.len() + 1);
                record = next;
            }

            prop_assert!(record.check_invariants().is_ok());
            prop_assert!(record.completed_gates.len() <= Gate::COUNT);
            for (idx, gate) in record.completed_gates.iter().enumerate() {
                prop_assert_eq!(gate.order(), idx);
            }
        }
    }

    /// A non-admin can only ever complete its own gate, and only when the
    /// article is waiting there.
    #[test]
    fn gate_roles_never_skip(steps in prop::collection::vec(arb_step(), 1..60)) {
        let registry = GateRegistry::new();
        let mut record = ApprovalRecord::new(ArticleId::generate(), Utc::now());

        for (role, transition, _) in steps {
            let actor = Actor::new(UserId::generate(), role);
            let before = record.current_gate();
            let expected = record.version;
            if let Ok(next) = plan(&registry, &record, actor, &transition, expected, Utc::now()) {
                if let (Transition::Approve { .. }, Some(home)) = (&transition, role.home_gate()) {
                    prop_assert_eq!(before, Some(home));
                    prop_assert_eq!(next.completed_gates.last().copied(), Some(home));
                }
                record = next;
            }
        }
    }

    /// Steps refused by the service leave the stored record untouched.
    #[test]
    fn refused_steps_are_side_effect_free(
        steps in prop::collection::vec(arb_step(), 1..40),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let storage = InMemoryStorage::new();
            let svc = service(Arc::new(storage.clone()));
            let id = svc
                .submit(
                    admin(),
                    Submission {
                        title: "Random walk".into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
                .id();

            for (role, transition, stale) in steps {
                let before = stored(&storage, id).await;
                let expected = if stale { before.version - 1 } else { before.version };
                let actor = Actor::new(UserId::generate(), role);

                let result = match transition {
                    Transition::Approve { notes } => {
                        svc.approve(actor, id, notes, Some(expected)).await
                    }
                    Transition::Reject { reason } => {
                        svc.reject(actor, id, reason, Some(expected)).await
                    }
                    Transition::Release => svc.release(actor, id, Some(expected)).await,
                    Transition::Reset => svc.reset(actor, id, Some(expected)).await,
                };

                let after = stored(&storage, id).await;
                match result {
                    Ok(outcome) => {
                        prop_assert!(!stale);
                        prop_assert_eq!(after.version, before.version + 1);
                        prop_assert_eq!(&after, &outcome.record);
                    }
                    Err(_) => {
                        prop_assert_eq!(after.version, before.version);
                        prop_assert_eq!(after.status, before.status);
                        prop_assert_eq!(&after.completed_gates, &before.completed_gates);
                        prop_assert_eq!(after.history.len(), before.history.len());
                    }
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}

// ---------------------------------------------------------------------------
// Lost compare-and-swap
// ---------------------------------------------------------------------------

fn service(storage: Arc<dyn Storage>) -> WorkflowService {
    let config = WorkflowConfig {
        cache_ttl_secs: 0,
        ..Default::default()
    };
    WorkflowService::new(storage, &config)
}

fn admin() -> Actor {
    Actor::new(UserId::generate(), Role::Admin)
}

async fn stored(storage: &InMemoryStorage, id: ArticleId) -> ApprovalRecord {
    storage.get(&id).await.unwrap().unwrap().record
}

/// Commits a competing record just before the next compare-and-swap
#[derive(Default)]
struct RacingStorage {
    inner: InMemoryStorage,
    rival: Mutex<Option<ApprovalRecord>>,
}

#[async_trait]
impl ApprovalStore for RacingStorage {
    async fn insert(&self, tracked: TrackedArticle) -> StoreResult<()> {
        self.inner.insert(tracked).await
    }

    async fn get(&self, id: &ArticleId) -> StoreResult<Option<TrackedArticle>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<TrackedArticle>> {
        self.inner.list().await
    }

    async fn list_pending(&self, gate: Option<Gate>) -> StoreResult<Vec<TrackedArticle>> {
        self.inner.list_pending(gate).await
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: ApprovalRecord,
    ) -> StoreResult<()> {
        let rival = self.rival.lock().unwrap().take();
        if let Some(rival) = rival {
            self.inner.compare_and_swap(rival.version - 1, rival).await?;
        }
        self.inner.compare_and_swap(expected_version, record).await
    }
}

#[async_trait]
impl RoleDirectory for RacingStorage {
    async fn get_role(&self, user_id: &UserId) -> StoreResult<Option<RoleAssignment>> {
        self.inner.get_role(user_id).await
    }

    async fn set_role(&self, assignment: RoleAssignment) -> StoreResult<()> {
        self.inner.set_role(assignment).await
    }
}

impl Storage for RacingStorage {}

#[tokio::test]
async fn lost_compare_and_swap_leaves_the_winner_intact() {
    let storage = Arc::new(RacingStorage::default());
    let svc = service(storage.clone());
    let id = svc
        .submit(
            admin(),
            Submission {
                title: "Contested".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id();

    let submitted = stored(&storage.inner, id).await;
    let marketing = Actor::new(UserId::generate(), Role::Marketing);
    let winner = plan(
        &GateRegistry::new(),
        &submitted,
        marketing,
        &Transition::Approve { notes: None },
        1,
        Utc::now(),
    )
    .unwrap();
    *storage.rival.lock().unwrap() = Some(winner.clone());

    let reviewer = Actor::new(UserId::generate(), Role::Marketing);
    let err = svc
        .reject(reviewer, id, "Claims need a source".into(), Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VersionConflict");

    let after = stored(&storage.inner, id).await;
    assert_eq!(after, winner);
    assert_eq!(after.version, 2);
    assert_eq!(after.status, ApprovalStatus::Pending(Gate::Branding));
    assert_eq!(after.history.len(), 1);
}
