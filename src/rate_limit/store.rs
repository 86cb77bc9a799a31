//! Quota Store
//!
//! Shared counter storage keyed by policy + identifier. The store is the only
//! piece of shared mutable state in the crate; callers interact with it
//! exclusively through atomic `increment` and `expire`, never read-modify-write.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Errors raised by a quota store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable
    #[error("quota store unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded the configured time bound
    #[error("quota store call timed out after {0}ms")]
    Timeout(u64),
}

/// Counter storage contract
///
/// `increment` must be atomic: concurrent increments against the same key from
/// different tasks may interleave in any order but never lose a count. A
/// returned count of 1 means the counter was just created (or had expired),
/// and is the caller's cue to set the window expiry.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Atomically increase the counter for `key` by 1 and return the new count
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// Set a time-to-live on `key`, effective only if the key has no expiry yet
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory quota store
///
/// Increments serialize through a single write lock, which provides the
/// atomicity the contract requires within one process. Expired counters are
/// reset lazily on the next increment.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuotaStore {
    counters: Arc<RwLock<HashMap<String, CounterEntry>>>,
}

impl InMemoryQuotaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current live count for a key (`None` if absent or expired)
    pub async fn count(&self, key: &str) -> Option<u64> {
        let counters = self.counters.read().await;
        let entry = counters.get(key)?;
        if entry.is_expired(Instant::now()) {
            None
        } else {
            Some(entry.count)
        }
    }

    /// Number of tracked keys, including expired ones awaiting reset
    pub async fn len(&self) -> usize {
        self.counters.read().await.len()
    }

    /// Drop all counters
    pub async fn clear(&self) {
        self.counters.write().await.clear();
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut counters = self.counters.write().await;
        let now = Instant::now();

        let entry = counters.entry(key.to_string()).or_insert(CounterEntry {
            count: 0,
            expires_at: None,
        });

        if entry.is_expired(now) {
            entry.count = 0;
            entry.expires_at = None;
        }

        entry.count += 1;
        Ok(entry.count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut counters = self.counters.write().await;

        if let Some(entry) = counters.get_mut(key) {
            // First call wins; re-setting would slide the window on every request.
            if entry.expires_at.is_none() {
                entry.expires_at = Some(Instant::now() + ttl);
            }
        }

        Ok(())
    }
}
