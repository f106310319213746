//! TTL read cache for queue pages and history lookups

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Snapshot of the cache generation taken before a store read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Time-bounded cache with explicit invalidation.
///
/// Any invalidation bumps the generation; a value loaded under an older
/// generation is dropped instead of cached, so a read that raced a write
/// cannot repopulate the cache with the pre-write state.
#[derive(Debug)]
pub struct ReadCache<K, V> {
    ttl: Duration,
    generation: AtomicU64,
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K, V> ReadCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// A zero `ttl` disables caching
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(expires_at, _)| Instant::now() < *expires_at)
            .map(|(_, value)| value.clone())
    }

    /// Cache `value` unless an invalidation happened since `observed`
    pub async fn insert(&self, observed: Generation, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.write().await;
        if self.generation() != observed {
            return;
        }
        let now = Instant::now();
        entries.retain(|_, (expires_at, _)| now < *expires_at);
        // A ttl too large to add to the clock is not cacheable.
        if let Some(expires_at) = now.checked_add(self.ttl) {
            entries.insert(key, (expires_at, value));
        }
    }

    pub async fn invalidate(&self, key: &K) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.remove(key);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
