//! Gate registry: static lookup over the gate sequence
//!
//! Pure functions only. The registry carries no state, so a single value can
//! be copied into every component and read from any number of tasks.

use approval_types::{ApprovalStatus, Gate, Role};

/// Ordered gates and the role authorized at each
#[derive(Clone, Copy, Debug, Default)]
pub struct GateRegistry;

impl GateRegistry {
    pub const fn new() -> Self {
        Self
    }

    /// Gates in pipeline order
    pub fn gates(&self) -> &'static [Gate] {
        &Gate::ALL
    }

    /// Gate an article in `status` is waiting on; `None` for approved,
    /// released and rejected.
    pub fn gate_for(&self, status: ApprovalStatus) -> Option<Gate> {
        status.pending_gate()
    }

    /// Status after `gate` is approved
    pub fn next_status(&self, gate: Gate) -> ApprovalStatus {
        match gate.next() {
            Some(next) => ApprovalStatus::Pending(next),
            None => ApprovalStatus::Approved,
        }
    }

    /// The gate-bound role that owns `gate`
    pub fn role_authorized(&self, gate: Gate) -> Role {
        match gate {
            Gate::Marketing => Role::Marketing,
            Gate::Branding => Role::Branding,
            Gate::SocL1 => Role::SocLevel1,
            Gate::SocL3 => Role::SocLevel3,
            Gate::Ciso => Role::Ciso,
        }
    }

    pub fn gate_for_role(&self, role: Role) -> Option<Gate> {
        role.home_gate()
    }

    /// Whether `role` may act on an article waiting at `gate`
    pub fn may_act_at(&self, role: Role, gate: Gate) -> bool {
        role.is_admin() || self.role_authorized(gate) == role
    }
}
