//! Domain events emitted after committed mutations
//!
//! Consumed by the notification/audit collaborator. Events are only ever
//! published after the store accepted the write.

use crate::gate::Gate;
use crate::ids::{ArticleId, UserId};
use crate::role::Role;
use crate::status::ApprovalStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every approval event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// User who triggered the event
    pub actor: Option<UserId>,

    /// The actual event
    pub event: ApprovalEvent,
}

impl ApprovalEventEnvelope {
    pub fn new(event: ApprovalEvent, actor: Option<UserId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            actor,
            event,
        }
    }
}

/// Workflow events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApprovalEvent {
    Submitted {
        article_id: ArticleId,
    },
    GateApproved {
        article_id: ArticleId,
        gate: Gate,
        next_status: ApprovalStatus,
        version: u64,
    },
    Rejected {
        article_id: ArticleId,
        gate: Gate,
        reason: String,
        version: u64,
    },
    Released {
        article_id: ArticleId,
        version: u64,
    },
    Reset {
        article_id: ArticleId,
        version: u64,
    },
    RoleUpdated {
        user_id: UserId,
        role: Role,
    },
}

impl ApprovalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ApprovalEvent::Submitted { .. } => "submitted",
            ApprovalEvent::GateApproved { .. } => "gate_approved",
            ApprovalEvent::Rejected { .. } => "rejected",
            ApprovalEvent::Released { .. } => "released",
            ApprovalEvent::Reset { .. } => "reset",
            ApprovalEvent::RoleUpdated { .. } => "role_updated",
        }
    }

    pub fn article_id(&self) -> Option<ArticleId> {
        match self {
            ApprovalEvent::Submitted { article_id }
            | ApprovalEvent::GateApproved { article_id, .. }
            | ApprovalEvent::Rejected { article_id, .. }
            | ApprovalEvent::Released { article_id, .. }
            | ApprovalEvent::Reset { article_id, .. } => Some(*article_id),
            ApprovalEvent::RoleUpdated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let article_id = ArticleId::generate();
        let event = ApprovalEvent::GateApproved {
            article_id,
            gate: Gate::Marketing,
            next_status: ApprovalStatus::Pending(Gate::Branding),
            version: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "gate_approved");
        assert_eq!(json["next_status"], "pending_branding");
        assert_eq!(event.article_id(), Some(article_id));
    }
}
