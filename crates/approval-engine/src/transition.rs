//! Transition engine
//!
//! [`plan`] is the pure core: given the stored record, the acting user and the
//! requested transition it either returns the successor record or the first
//! failing check. [`TransitionEngine`] wraps it with a store load and an
//! atomic compare-and-swap on the record version.
//!
//! Checks run in a fixed order so callers always see the same error for the
//! same situation:
//!
//! 1. caller role
//! 2. input validation
//! 3. expected version against the stored version
//! 4. state and gate rules
//! 5. compare-and-swap

use crate::registry::GateRegistry;
use crate::store::{with_timeout, Storage};
use approval_types::{
    Actor, ApprovalError, ApprovalEvent, ApprovalRecord, ApprovalResult, ApprovalStatus, ArticleId,
    Gate, HistoryAction, HistoryEntry, RejectionDetails, ReleaseDetails,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Maximum characters in approval notes
pub const MAX_NOTES_CHARS: usize = 1000;

/// Minimum characters in a trimmed rejection reason
pub const MIN_REASON_CHARS: usize = 10;

/// Maximum characters in a trimmed rejection reason
pub const MAX_REASON_CHARS: usize = 2000;

/// A requested state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Approve { notes: Option<String> },
    Reject { reason: String },
    Release,
    Reset,
}

impl Transition {
    pub fn action(&self) -> HistoryAction {
        match self {
            Transition::Approve { .. } => HistoryAction::Approve,
            Transition::Reject { .. } => HistoryAction::Reject,
            Transition::Release => HistoryAction::Release,
            Transition::Reset => HistoryAction::Reset,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Approve { .. } => "approve",
            Transition::Reject { .. } => "reject",
            Transition::Release => "release",
            Transition::Reset => "reset",
        }
    }
}

/// Result of a committed transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub previous_status: ApprovalStatus,
    /// Gate approved or rejected; `None` for release and reset
    pub gate: Option<Gate>,
    pub record: ApprovalRecord,
    pub event: ApprovalEvent,
}

/// Compute the successor of `record` for `transition` performed by `actor`.
///
/// `expected_version` is the version the caller last observed.
pub fn plan(
    registry: &GateRegistry,
    record: &ApprovalRecord,
    actor: Actor,
    transition: &Transition,
    expected_version: u64,
    now: DateTime<Utc>,
) -> ApprovalResult<ApprovalRecord> {
    check_role(actor, transition)?;
    let input = validate_input(transition)?;

    if expected_version != record.version {
        return Err(ApprovalError::VersionConflict {
            expected: expected_version,
            actual: record.version,
        });
    }

    let mut next = record.clone();
    let gate = match transition {
        Transition::Approve { .. } => {
            let gate = approval_gate(record, actor)?;
            next.completed_gates.push(gate);
            next.status = registry.next_status(gate);
            Some(gate)
        }
        Transition::Reject { .. } => {
            let gate = rejection_gate(registry, record, actor)?;
            next.status = ApprovalStatus::Rejected;
            next.rejection = Some(RejectionDetails {
                reason: input.clone().unwrap_or_default(),
                rejected_by: actor.id,
                rejected_at: now,
            });
            Some(gate)
        }
        Transition::Release => {
            require_status(record, ApprovalStatus::Approved, "release")?;
            next.status = ApprovalStatus::Released;
            next.release = Some(ReleaseDetails {
                released_by: actor.id,
                released_at: now,
            });
            None
        }
        Transition::Reset => {
            require_status(record, ApprovalStatus::Rejected, "reset")?;
            next.status = ApprovalStatus::initial();
            next.completed_gates.clear();
            next.rejection = None;
            None
        }
    };

    next.version = record.version + 1;
    next.updated_at = now;
    next.history.push(HistoryEntry {
        gate,
        actor_id: actor.id,
        actor_role: actor.role,
        action: transition.action(),
        timestamp: now,
        notes: input,
    });

    next.check_invariants().map_err(|e| ApprovalError::Internal(e.to_string()))?;

    Ok(next)
}

fn check_role(actor: Actor, transition: &Transition) -> ApprovalResult<()> {
    let allowed = match transition {
        Transition::Approve { .. } | Transition::Reject { .. } => actor.role.is_reviewer(),
        Transition::Release => actor.role.can_release(),
        Transition::Reset => actor.role.can_reset(),
    };
    if allowed {
        Ok(())
    } else {
        Err(ApprovalError::InsufficientRole(format!(
            "role {} may not {} articles",
            actor.role,
            transition.verb()
        )))
    }
}

/// Validate free text and return the normalized value for the history entry
fn validate_input(transition: &Transition) -> ApprovalResult<Option<String>> {
    match transition {
        Transition::Approve { notes } => {
            let notes = notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty());
            if let Some(n) = notes {
                if n.chars().count() > MAX_NOTES_CHARS {
                    return Err(ApprovalError::Validation(format!(
                        "notes must be at most {} characters",
                        MAX_NOTES_CHARS
                    )));
                }
            }
            Ok(notes.map(str::to_string))
        }
        Transition::Reject { reason } => {
            let reason = reason.trim();
            let len = reason.chars().count();
            if len < MIN_REASON_CHARS {
                return Err(ApprovalError::Validation(format!(
                    "rejection reason must be at least {} characters",
                    MIN_REASON_CHARS
                )));
            }
            if len > MAX_REASON_CHARS {
                return Err(ApprovalError::Validation(format!(
                    "rejection reason must be at most {} characters",
                    MAX_REASON_CHARS
                )));
            }
            Ok(Some(reason.to_string()))
        }
        Transition::Release | Transition::Reset => Ok(None),
    }
}

/// Gate an approval by `actor` would complete.
///
/// A pending record only accepts approval at its current gate. Once every
/// gate is done, approving again reports the gate as already approved.
fn approval_gate(record: &ApprovalRecord, actor: Actor) -> ApprovalResult<Gate> {
    if let Some(current) = record.current_gate() {
        return match actor.role.home_gate() {
            Some(home) if home != current => Err(ApprovalError::WrongGate {
                role: actor.role,
                current: Some(current),
            }),
            // Admins act as the current gate's role, one gate at a time.
            _ => Ok(current),
        };
    }

    match actor.role.home_gate() {
        Some(home) if !record.is_rejected() && record.is_completed(home) => {
            Err(ApprovalError::GateAlreadyApproved(home))
        }
        _ => Err(ApprovalError::WrongState {
            status: record.status,
            action: "approve",
        }),
    }
}

fn rejection_gate(
    registry: &GateRegistry,
    record: &ApprovalRecord,
    actor: Actor,
) -> ApprovalResult<Gate> {
    let current = record.current_gate().ok_or(ApprovalError::WrongState {
        status: record.status,
        action: "reject",
    })?;
    if !registry.may_act_at(actor.role, current) {
        return Err(ApprovalError::WrongGate {
            role: actor.role,
            current: Some(current),
        });
    }
    Ok(current)
}

/// Every transition names the version it was decided against
pub fn require_version(expected_version: Option<u64>) -> ApprovalResult<u64> {
    expected_version.ok_or_else(|| {
        ApprovalError::Validation(
            "expectedVersion is required (body field or If-Match header)".into(),
        )
    })
}

fn require_status(
    record: &ApprovalRecord,
    required: ApprovalStatus,
    action: &'static str,
) -> ApprovalResult<()> {
    if record.status == required {
        Ok(())
    } else {
        Err(ApprovalError::WrongState {
            status: record.status,
            action,
        })
    }
}

fn event_for(
    outcome_record: &ApprovalRecord,
    gate: Option<Gate>,
    transition: &Transition,
) -> ApprovalEvent {
    let article_id = outcome_record.article_id;
    let version = outcome_record.version;
    match (transition, gate) {
        (Transition::Approve { .. }, Some(gate)) => ApprovalEvent::GateApproved {
            article_id,
            gate,
            next_status: outcome_record.status,
            version,
        },
        (Transition::Reject { .. }, Some(gate)) => ApprovalEvent::Rejected {
            article_id,
            gate,
            reason: outcome_record
                .rejection
                .as_ref()
                .map(|r| r.reason.clone())
                .unwrap_or_default(),
            version,
        },
        (Transition::Release, _) => ApprovalEvent::Released { article_id, version },
        _ => ApprovalEvent::Reset { article_id, version },
    }
}

/// Load, plan and commit transitions against a store
#[derive(Clone)]
pub struct TransitionEngine {
    storage: Arc<dyn Storage>,
    registry: GateRegistry,
    store_timeout: Duration,
}

impl TransitionEngine {
    pub fn new(storage: Arc<dyn Storage>, store_timeout: Duration) -> Self {
        Self {
            storage,
            registry: GateRegistry::new(),
            store_timeout,
        }
    }

    pub fn registry(&self) -> &GateRegistry {
        &self.registry
    }

    /// Apply `transition` to the article if it is still at
    /// `expected_version`. A missing version is a validation error. The
    /// engine never retries; a lost race surfaces as
    /// [`ApprovalError::VersionConflict`].
    pub async fn execute(
        &self,
        article_id: ArticleId,
        actor: Actor,
        transition: Transition,
        expected_version: Option<u64>,
    ) -> ApprovalResult<TransitionOutcome> {
        check_role(actor, &transition)?;
        validate_input(&transition)?;
        let expected_version = require_version(expected_version)?;

        let tracked = with_timeout(self.store_timeout, "get", self.storage.get(&article_id))
            .await?
            .ok_or_else(|| ApprovalError::NotFound(format!("article {}", article_id)))?;
        let current = tracked.record;

        let next = plan(
            &self.registry,
            &current,
            actor,
            &transition,
            expected_version,
            Utc::now(),
        )?;

        with_timeout(
            self.store_timeout,
            "compare_and_swap",
            self.storage.compare_and_swap(current.version, next.clone()),
        )
        .await?;

        let gate = next.history.last().and_then(|entry| entry.gate);
        let event = event_for(&next, gate, &transition);

        tracing::info!(
            article_id = %article_id,
            actor_id = %actor.id,
            role = %actor.role,
            action = transition.verb(),
            from = %current.status,
            to = %next.status,
            version = next.version,
            "Transition committed"
        );

        Ok(TransitionOutcome {
            previous_status: current.status,
            gate,
            record: next,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approval_types::{Role, UserId};

    const REGISTRY: GateRegistry = GateRegistry::new();

    fn actor(role: Role) -> Actor {
        Actor::new(UserId::generate(), role)
    }

    fn fresh() -> ApprovalRecord {
        ApprovalRecord::new(ArticleId::generate(), Utc::now())
    }

    fn approve() -> Transition {
        Transition::Approve { notes: None }
    }

    fn step(
        record: &ApprovalRecord,
        role: Role,
        transition: Transition,
    ) -> ApprovalResult<ApprovalRecord> {
        plan(
            &REGISTRY,
            record,
            actor(role),
            &transition,
            record.version,
            Utc::now(),
        )
    }

    fn approved_through(gates: usize) -> ApprovalRecord {
        let mut record = fresh();
        for gate in &Gate::ALL[..gates] {
            let role = REGISTRY.role_authorized(*gate);
            record = step(&record, role, approve()).unwrap();
        }
        record
    }

    #[test]
    fn test_marketing_approval_advances_one_gate() {
        let next = step(&fresh(), Role::Marketing, approve()).unwrap();
        assert_eq!(next.status, ApprovalStatus::Pending(Gate::Branding));
        assert_eq!(next.completed_gates, vec![Gate::Marketing]);
        assert_eq!(next.version, 2);
        assert_eq!(next.history.len(), 1);
        assert_eq!(next.history[0].action, HistoryAction::Approve);
        assert_eq!(next.history[0].gate, Some(Gate::Marketing));
    }

    #[test]
    fn test_full_chain_reaches_approved() {
        let record = approved_through(5);
        assert_eq!(record.status, ApprovalStatus::Approved);
        assert_eq!(record.completed_gates, Gate::ALL.to_vec());
        assert_eq!(record.version, 6);
    }

    #[test]
    fn test_gate_skip_is_wrong_gate() {
        let record = approved_through(2);
        let err = step(&record, Role::SocLevel3, approve()).unwrap_err();
        assert_eq!(
            err,
            ApprovalError::WrongGate {
                role: Role::SocLevel3,
                current: Some(Gate::SocL1)
            }
        );
    }

    #[test]
    fn test_completed_gate_while_pending_is_wrong_gate() {
        let record = approved_through(2);
        let err = step(&record, Role::Branding, approve()).unwrap_err();
        assert_eq!(
            err,
            ApprovalError::WrongGate {
                role: Role::Branding,
                current: Some(Gate::SocL1)
            }
        );
    }

    #[test]
    fn test_approved_record_is_already_approved() {
        let record = approved_through(5);
        let err = step(&record, Role::Ciso, approve()).unwrap_err();
        assert_eq!(err, ApprovalError::GateAlreadyApproved(Gate::Ciso));

        let err = step(&record, Role::Admin, approve()).unwrap_err();
        assert_eq!(err.code(), "WrongState");
    }

    #[test]
    fn test_admin_acts_as_current_gate() {
        let record = approved_through(1);
        let next = step(&record, Role::Admin, approve()).unwrap();
        assert_eq!(next.completed_gates, vec![Gate::Marketing, Gate::Branding]);
        assert_eq!(next.history[0].gate, Some(Gate::Marketing));
        assert_eq!(next.history[1].actor_role, Role::Admin);
    }

    #[test]
    fn test_admin_cannot_approve_approved() {
        let record = approved_through(5);
        let err = step(&record, Role::Admin, approve()).unwrap_err();
        assert_eq!(err.code(), "WrongState");
    }

    #[test]
    fn test_approve_rejected_is_wrong_state() {
        let rejected = step(
            &fresh(),
            Role::Marketing,
            Transition::Reject {
                reason: "Off-brand headline wording".into(),
            },
        )
        .unwrap();
        let err = step(&rejected, Role::Marketing, approve()).unwrap_err();
        assert_eq!(err.code(), "WrongState");
    }

    #[test]
    fn test_non_reviewer_is_insufficient_role() {
        for role in [Role::User, Role::Analyst, Role::Viewer] {
            let err = step(&fresh(), role, approve()).unwrap_err();
            assert_eq!(err.code(), "InsufficientRole");
        }
    }

    #[test]
    fn test_notes_length_limit() {
        let notes = "n".repeat(MAX_NOTES_CHARS + 1);
        let err = step(&fresh(), Role::Marketing, Transition::Approve { notes: Some(notes) })
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let next = step(
            &fresh(),
            Role::Marketing,
            Transition::Approve {
                notes: Some("  looks good  ".into()),
            },
        )
        .unwrap();
        assert_eq!(next.history[0].notes.as_deref(), Some("looks good"));
    }

    #[test]
    fn test_version_checked_before_gate_rules() {
        let record = approved_through(2);
        let err = plan(
            &REGISTRY,
            &record,
            actor(Role::Marketing),
            &approve(),
            1,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ApprovalError::VersionConflict {
                expected: 1,
                actual: 3
            }
        );
    }

    #[test]
    fn test_reject_reason_bounds() {
        for reason in ["too short", "         x         ", ""] {
            let err = step(
                &fresh(),
                Role::Marketing,
                Transition::Reject {
                    reason: reason.into(),
                },
            )
            .unwrap_err();
            assert_eq!(err.code(), "ValidationError");
        }

        let err = step(
            &fresh(),
            Role::Marketing,
            Transition::Reject {
                reason: "r".repeat(MAX_REASON_CHARS + 1),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        // Counted in characters, not bytes.
        let next = step(
            &fresh(),
            Role::Marketing,
            Transition::Reject {
                reason: "é".repeat(MIN_REASON_CHARS),
            },
        )
        .unwrap();
        assert_eq!(next.status, ApprovalStatus::Rejected);
    }

    #[test]
    fn test_reject_records_details_and_keeps_gates() {
        let record = approved_through(2);
        let reviewer = actor(Role::SocLevel1);
        let next = plan(
            &REGISTRY,
            &record,
            reviewer,
            &Transition::Reject {
                reason: "  IOC list is incomplete  ".into(),
            },
            3,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(next.status, ApprovalStatus::Rejected);
        assert_eq!(next.completed_gates, vec![Gate::Marketing, Gate::Branding]);
        let rejection = next.rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, "IOC list is incomplete");
        assert_eq!(rejection.rejected_by, reviewer.id);
        assert_eq!(next.history.last().unwrap().gate, Some(Gate::SocL1));
    }

    #[test]
    fn test_reject_by_wrong_role() {
        let err = step(
            &fresh(),
            Role::Ciso,
            Transition::Reject {
                reason: "Not ready for distribution".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "WrongGate");
    }

    #[test]
    fn test_reject_terminal_is_wrong_state() {
        let record = approved_through(5);
        let err = step(
            &record,
            Role::Admin,
            Transition::Reject {
                reason: "Changed our mind about it".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "WrongState");
    }

    #[test]
    fn test_release_rules() {
        let err = step(&approved_through(4), Role::Ciso, Transition::Release).unwrap_err();
        assert_eq!(err.code(), "WrongState");

        let err = step(&approved_through(5), Role::Marketing, Transition::Release).unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        let released = step(&approved_through(5), Role::Ciso, Transition::Release).unwrap();
        assert_eq!(released.status, ApprovalStatus::Released);
        assert!(released.release.is_some());
        assert_eq!(released.history.last().unwrap().action, HistoryAction::Release);

        let err = step(&released, Role::Admin, Transition::Release).unwrap_err();
        assert_eq!(err.code(), "WrongState");
    }

    #[test]
    fn test_reset_rules() {
        let rejected = step(
            &approved_through(3),
            Role::SocLevel3,
            Transition::Reject {
                reason: "Attribution claims unsupported".into(),
            },
        )
        .unwrap();

        let err = step(&rejected, Role::Ciso, Transition::Reset).unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");

        let err = step(&approved_through(1), Role::Admin, Transition::Reset).unwrap_err();
        assert_eq!(err.code(), "WrongState");

        let reset = step(&rejected, Role::SuperAdmin, Transition::Reset).unwrap();
        assert_eq!(reset.status, ApprovalStatus::Pending(Gate::Marketing));
        assert!(reset.completed_gates.is_empty());
        assert!(reset.rejection.is_none());
        assert_eq!(reset.version, rejected.version + 1);
        assert_eq!(reset.history.len(), rejected.history.len() + 1);
    }

    #[test]
    fn test_missing_version_is_validation_error() {
        assert_eq!(require_version(Some(4)).unwrap(), 4);
        let err = require_version(None).unwrap_err();
        assert_eq!(err.code(), "ValidationError");
    }

    #[tokio::test]
    async fn test_execute_requires_version_after_role_check() {
        let storage = Arc::new(crate::store::InMemoryStorage::new());
        let engine = TransitionEngine::new(storage, Duration::from_secs(1));

        let err = engine
            .execute(ArticleId::generate(), actor(Role::Marketing), approve(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let err = engine
            .execute(ArticleId::generate(), actor(Role::Ciso), Transition::Reset, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientRole");
    }

    #[test]
    fn test_event_for_approval() {
        let next = step(&fresh(), Role::Marketing, approve()).unwrap();
        let event = event_for(&next, Some(Gate::Marketing), &approve());
        assert_eq!(
            event,
            ApprovalEvent::GateApproved {
                article_id: next.article_id,
                gate: Gate::Marketing,
                next_status: ApprovalStatus::Pending(Gate::Branding),
                version: 2,
            }
        );
    }
}
