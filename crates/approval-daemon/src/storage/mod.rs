//! Storage backends provided by the daemon
//!
//! The in-memory store lives in `approval-engine`; the daemon adds the
//! PostgreSQL backend selected through `storage.type = "postgres"`.

mod postgres;

pub use approval_engine::{InMemoryStorage, Storage};
pub use postgres::PostgresStorage;
