//! Approval Engine - gate sequencing, transitions and review queues
//!
//! The engine enforces that every article passes the five review gates in
//! order, exactly once each, with optimistic concurrency on the record
//! version.
//!
//! ## Architecture
//!
//! ```text
//! WorkflowService
//!   ├── role directory lookup + reviewer pre-check
//!   ├── TransitionEngine ── plan() ── compare_and_swap
//!   ├── QueueResolver (pure)
//!   ├── ReadCache (queue pages, records)
//!   └── broadcast::Sender<ApprovalEventEnvelope>
//! ```
//!
//! Storage is pluggable through [`store::Storage`]; [`store::InMemoryStorage`]
//! ships with the crate.

#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod queue;
pub mod registry;
pub mod service;
pub mod store;
pub mod transition;

pub use cache::ReadCache;
pub use config::WorkflowConfig;
pub use queue::{
    Pagination, QueueFilters, QueuePage, QueueQuery, QueueResolver, SortBy, SortOrder,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use registry::GateRegistry;
pub use service::{Submission, WorkflowService};
pub use store::{
    ApprovalStore, InMemoryStorage, RoleDirectory, Storage, StoreError, StoreResult,
};
pub use transition::{plan, Transition, TransitionEngine, TransitionOutcome};
