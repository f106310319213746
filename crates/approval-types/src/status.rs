//! Approval status

use crate::error::ApprovalError;
use crate::gate::Gate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PENDING_PREFIX: &str = "pending_";

/// Where an article sits in the approval pipeline.
///
/// Serialized as `pending_<gate>`, `approved`, `released` or `rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ApprovalStatus {
    /// Waiting for review at the given gate
    Pending(Gate),
    /// All gates passed, awaiting release
    Approved,
    /// Published
    Released,
    /// Removed from the pipeline by a reviewer; only an admin reset revives it
    Rejected,
}

impl ApprovalStatus {
    /// Every status, pending ones first in gate order
    pub fn all() -> Vec<ApprovalStatus> {
        Gate::ALL
            .into_iter()
            .map(ApprovalStatus::Pending)
            .chain([
                ApprovalStatus::Approved,
                ApprovalStatus::Released,
                ApprovalStatus::Rejected,
            ])
            .collect()
    }

    /// Status of a freshly submitted article
    pub fn initial() -> Self {
        ApprovalStatus::Pending(Gate::first())
    }

    pub fn pending_gate(&self) -> Option<Gate> {
        match self {
            ApprovalStatus::Pending(gate) => Some(*gate),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ApprovalStatus::Pending(_))
    }

    /// No forward transition is defined (`rejected` can still be reset)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalStatus::Released | ApprovalStatus::Rejected)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending(gate) => write!(f, "{}{}", PENDING_PREFIX, gate.key()),
            ApprovalStatus::Approved => f.write_str("approved"),
            ApprovalStatus::Released => f.write_str("released"),
            ApprovalStatus::Rejected => f.write_str("rejected"),
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(ApprovalStatus::Approved),
            "released" => Ok(ApprovalStatus::Released),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => other
                .strip_prefix(PENDING_PREFIX)
                .and_then(|key| key.parse::<Gate>().ok())
                .map(ApprovalStatus::Pending)
                .ok_or_else(|| ApprovalError::Validation(format!("unknown status: {}", s))),
        }
    }
}

impl From<ApprovalStatus> for String {
    fn from(status: ApprovalStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for ApprovalStatus {
    type Error = ApprovalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings() {
        assert_eq!(ApprovalStatus::initial().to_string(), "pending_marketing");
        assert_eq!(
            ApprovalStatus::Pending(Gate::SocL1).to_string(),
            "pending_soc_l1"
        );
        assert_eq!(
            "pending_ciso".parse::<ApprovalStatus>().unwrap(),
            ApprovalStatus::Pending(Gate::Ciso)
        );
        assert!("pending_voc".parse::<ApprovalStatus>().is_err());
        assert!("draft".parse::<ApprovalStatus>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ApprovalStatus::Pending(Gate::Branding)).unwrap();
        assert_eq!(json, "\"pending_branding\"");
        let status: ApprovalStatus = serde_json::from_str("\"released\"").unwrap();
        assert_eq!(status, ApprovalStatus::Released);
        assert!(serde_json::from_str::<ApprovalStatus>("\"pending_\"").is_err());
    }

    #[test]
    fn test_classification() {
        assert!(ApprovalStatus::Rejected.is_terminal());
        assert!(!ApprovalStatus::Approved.is_terminal());
        assert_eq!(ApprovalStatus::Approved.pending_gate(), None);
        assert_eq!(ApprovalStatus::all().len(), Gate::COUNT + 3);
    }
}
