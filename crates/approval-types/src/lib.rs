//! Approval Types - Core vocabulary for the bulletin approval workflow
//!
//! Every newsletter article and threat bulletin passes through a fixed,
//! strictly ordered sequence of review gates before it can be published:
//!
//! ```text
//! marketing -> branding -> soc_l1 -> soc_l3 -> ciso -> approved -> released
//! ```
//!
//! ## Key Concepts
//!
//! - **Gate**: one stage of the pipeline, owned by exactly one reviewer role
//! - **ApprovalStatus**: where an article currently sits (`pending_<gate>`,
//!   `approved`, `released`, `rejected`)
//! - **ApprovalRecord**: per-article state, completed gates, optimistic-lock
//!   version and append-only history
//! - **Events**: domain events consumed by the notification/audit side
//!
//! Status strings such as `pending_branding` exist only at serialization
//! boundaries; business logic branches on [`ApprovalStatus`] and [`Gate`].

#![deny(unsafe_code)]

pub mod actor;
pub mod article;
pub mod error;
pub mod events;
pub mod gate;
pub mod ids;
pub mod progress;
pub mod record;
pub mod role;
pub mod status;

// Re-export main types
pub use actor::{Actor, RoleAssignment};
pub use article::{Article, Severity, TrackedArticle};
pub use error::{ApprovalError, ApprovalResult, ErrorClass};
pub use events::{ApprovalEvent, ApprovalEventEnvelope};
pub use gate::Gate;
pub use ids::{ArticleId, UserId};
pub use progress::ApprovalProgress;
pub use record::{
    ApprovalRecord, HistoryAction, HistoryEntry, InvariantViolation, RejectionDetails,
    ReleaseDetails,
};
pub use role::Role;
pub use status::ApprovalStatus;
