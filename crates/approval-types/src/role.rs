//! User roles and their relationship to gates

use crate::error::ApprovalError;
use crate::gate::Gate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role asserted for a user by the auth collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "marketing")]
    Marketing,
    #[serde(rename = "branding")]
    Branding,
    #[serde(rename = "soc_level_1")]
    SocLevel1,
    #[serde(rename = "soc_level_3")]
    SocLevel3,
    #[serde(rename = "ciso")]
    Ciso,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "super_admin")]
    SuperAdmin,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "analyst")]
    Analyst,
    #[serde(rename = "viewer")]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Marketing,
        Role::Branding,
        Role::SocLevel1,
        Role::SocLevel3,
        Role::Ciso,
        Role::Admin,
        Role::SuperAdmin,
        Role::User,
        Role::Analyst,
        Role::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Marketing => "marketing",
            Role::Branding => "branding",
            Role::SocLevel1 => "soc_level_1",
            Role::SocLevel3 => "soc_level_3",
            Role::Ciso => "ciso",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
            Role::User => "user",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
        }
    }

    /// The gate this role reviews, if it is gate-bound
    pub fn home_gate(&self) -> Option<Gate> {
        match self {
            Role::Marketing => Some(Gate::Marketing),
            Role::Branding => Some(Gate::Branding),
            Role::SocLevel1 => Some(Gate::SocL1),
            Role::SocLevel3 => Some(Gate::SocL3),
            Role::Ciso => Some(Gate::Ciso),
            _ => None,
        }
    }

    /// `admin` and `super_admin` may act at any gate
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Gate roles plus admins; everyone else is refused before any
    /// workflow logic runs.
    pub fn is_reviewer(&self) -> bool {
        self.is_admin() || self.home_gate().is_some()
    }

    pub fn can_release(&self) -> bool {
        self.is_admin() || *self == Role::Ciso
    }

    pub fn can_reset(&self) -> bool {
        self.is_admin()
    }

    pub fn can_manage_roles(&self) -> bool {
        self.is_admin()
    }

    /// Whether a holder of this role may grant `target` to someone
    pub fn can_grant(&self, target: Role) -> bool {
        match target {
            Role::SuperAdmin => *self == Role::SuperAdmin,
            _ => self.can_manage_roles(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ApprovalError::Validation(format!("unknown role: {}", s)))
    }
}
