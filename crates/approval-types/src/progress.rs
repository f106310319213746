//! Derived progress view

use crate::gate::Gate;
use crate::status::ApprovalStatus;
use serde::{Deserialize, Serialize};

/// How far an article has travelled through the gates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalProgress {
    pub completed_gates: Vec<Gate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_gate: Option<Gate>,
    pub pending_gates: Vec<Gate>,
    pub total_gates: usize,
    pub completed_count: usize,
}

impl ApprovalProgress {
    pub fn new(status: ApprovalStatus, completed: &[Gate]) -> Self {
        let current_gate = status.pending_gate();
        let completed_gates: Vec<Gate> = Gate::ALL
            .into_iter()
            .filter(|g| completed.contains(g))
            .collect();
        let pending_gates = Gate::ALL
            .into_iter()
            .filter(|g| !completed.contains(g) && Some(*g) != current_gate)
            .collect();

        Self {
            completed_count: completed_gates.len(),
            completed_gates,
            current_gate,
            pending_gates,
            total_gates: Gate::COUNT,
        }
    }
}
