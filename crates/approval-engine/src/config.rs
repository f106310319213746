//! Workflow engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for caching, store access and event fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Read cache TTL in seconds; 0 disables caching
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on every store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Capacity of the event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl WorkflowConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            store_timeout_ms: default_store_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_event_buffer() -> usize {
    1024
}
