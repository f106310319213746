//! Approval gates
//!
//! The gate sequence is fixed at compile time. A gate's position in
//! [`Gate::ALL`] is its order; nothing else defines ordering.

use crate::error::ApprovalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One stage of the review pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gate {
    #[serde(rename = "marketing")]
    Marketing,
    #[serde(rename = "branding")]
    Branding,
    #[serde(rename = "soc_l1")]
    SocL1,
    #[serde(rename = "soc_l3")]
    SocL3,
    #[serde(rename = "ciso")]
    Ciso,
}

impl Gate {
    /// All gates in pipeline order
    pub const ALL: [Gate; 5] = [
        Gate::Marketing,
        Gate::Branding,
        Gate::SocL1,
        Gate::SocL3,
        Gate::Ciso,
    ];

    /// Number of gates in the pipeline
    pub const COUNT: usize = Self::ALL.len();

    /// Stable key used on the wire and in status strings
    pub fn key(&self) -> &'static str {
        match self {
            Gate::Marketing => "marketing",
            Gate::Branding => "branding",
            Gate::SocL1 => "soc_l1",
            Gate::SocL3 => "soc_l3",
            Gate::Ciso => "ciso",
        }
    }

    /// Zero-based position in the pipeline
    pub fn order(&self) -> usize {
        match self {
            Gate::Marketing => 0,
            Gate::Branding => 1,
            Gate::SocL1 => 2,
            Gate::SocL3 => 3,
            Gate::Ciso => 4,
        }
    }

    pub fn from_order(order: usize) -> Option<Gate> {
        Self::ALL.get(order).copied()
    }

    pub fn first() -> Gate {
        Gate::Marketing
    }

    /// The gate after this one, or `None` for the last gate
    pub fn next(&self) -> Option<Gate> {
        Self::from_order(self.order() + 1)
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Gate {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gate::ALL
            .into_iter()
            .find(|g| g.key() == s)
            .ok_or_else(|| ApprovalError::Validation(format!("unknown gate: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_position() {
        for (idx, gate) in Gate::ALL.iter().enumerate() {
            assert_eq!(gate.order(), idx);
            assert_eq!(Gate::from_order(idx), Some(*gate));
        }
        assert_eq!(Gate::from_order(Gate::COUNT), None);
    }

    #[test]
    fn test_next_walks_pipeline() {
        assert_eq!(Gate::Marketing.next(), Some(Gate::Branding));
        assert_eq!(Gate::SocL3.next(), Some(Gate::Ciso));
        assert_eq!(Gate::Ciso.next(), None);
        assert!(Gate::Ciso.is_last());
    }

    #[test]
    fn test_key_round_trip() {
        for gate in Gate::ALL {
            assert_eq!(gate.key().parse::<Gate>().unwrap(), gate);
        }
        assert!("voc".parse::<Gate>().is_err());
    }

    #[test]
    fn test_serde_uses_key() {
        assert_eq!(serde_json::to_string(&Gate::SocL1).unwrap(), "\"soc_l1\"");
        let gate: Gate = serde_json::from_str("\"soc_l3\"").unwrap();
        assert_eq!(gate, Gate::SocL3);
    }
}
