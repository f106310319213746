//! Per-article approval record

use crate::gate::Gate;
use crate::ids::{ArticleId, UserId};
use crate::progress::ApprovalProgress;
use crate::role::Role;
use crate::status::ApprovalStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a history entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Approve,
    Reject,
    Release,
    Reset,
}

/// One append-only audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Gate acted on; absent for release and reset
    pub gate: Option<Gate>,
    pub actor_id: UserId,
    pub actor_role: Role,
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionDetails {
    pub reason: String,
    pub rejected_by: UserId,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDetails {
    pub released_by: UserId,
    pub released_at: DateTime<Utc>,
}

/// Approval state for a single article.
///
/// `completed_gates` is always a prefix of [`Gate::ALL`], a pending status
/// always names the first gate not yet completed, and `version` grows by
/// exactly one per committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub article_id: ArticleId,
    pub status: ApprovalStatus,
    pub completed_gates: Vec<Gate>,
    pub version: u64,
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record whose fields contradict each other
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("approval record {article_id} violates invariant: {detail}")]
pub struct InvariantViolation {
    pub article_id: ArticleId,
    pub detail: String,
}

impl ApprovalRecord {
    /// Fresh record at `pending_marketing`, version 1
    pub fn new(article_id: ArticleId, now: DateTime<Utc>) -> Self {
        Self {
            article_id,
            status: ApprovalStatus::initial(),
            completed_gates: Vec::new(),
            version: 1,
            history: Vec::new(),
            rejection: None,
            release: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn current_gate(&self) -> Option<Gate> {
        self.status.pending_gate()
    }

    pub fn is_completed(&self, gate: Gate) -> bool {
        self.completed_gates.contains(&gate)
    }

    /// First gate not yet completed
    pub fn next_open_gate(&self) -> Option<Gate> {
        Gate::from_order(self.completed_gates.len())
    }

    pub fn is_rejected(&self) -> bool {
        self.status == ApprovalStatus::Rejected
    }

    pub fn progress(&self) -> ApprovalProgress {
        ApprovalProgress::new(self.status, &self.completed_gates)
    }

    /// Verify the structural invariants of the record
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let violation = |detail: String| InvariantViolation {
            article_id: self.article_id,
            detail,
        };

        if self.completed_gates.len() > Gate::COUNT {
            return Err(violation(format!(
                "{} completed gates exceeds pipeline length",
                self.completed_gates.len()
            )));
        }

        for (idx, gate) in self.completed_gates.iter().enumerate() {
            if gate.order() != idx {
                return Err(violation(format!(
                    "completed gates {:?} are not a prefix of the gate order",
                    self.completed_gates
                )));
            }
        }

        match self.status {
            ApprovalStatus::Pending(gate) if Some(gate) != self.next_open_gate() => {
                Err(violation(format!(
                    "status {} but next open gate is {:?}",
                    self.status,
                    self.next_open_gate()
                )))
            }
            ApprovalStatus::Approved | ApprovalStatus::Released
                if self.completed_gates.len() != Gate::COUNT =>
            {
                Err(violation(format!(
                    "status {} with only {} completed gates",
                    self.status,
                    self.completed_gates.len()
                )))
            }
            _ => Ok(()),
        }
    }
}
