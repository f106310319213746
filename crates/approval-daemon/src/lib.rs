//! approvald library
//!
//! This module provides the core components for the approval daemon:
//! - REST API handlers
//! - Storage backends
//! - Audit sink
//! - Server lifecycle management

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;

pub use config::DaemonConfig;
pub use error::{ApiError, ApiResult, DaemonError, DaemonResult};
pub use server::Server;
pub use storage::{InMemoryStorage, PostgresStorage, Storage};
