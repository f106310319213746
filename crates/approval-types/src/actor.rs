//! Acting users and role assignments

use crate::ids::UserId;
use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The caller of a workflow operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Same user acting under a different role
    pub fn with_role(self, role: Role) -> Self {
        Self { role, ..self }
    }
}

/// Role granted to a user through the role directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub user_id: UserId,
    pub role: Role,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}
