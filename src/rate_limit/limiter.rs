//! Rate Limiter
//!
//! Wraps a [`QuotaStore`] with named policies and produces allow/deny
//! decisions with remaining-quota and reset-time metadata.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::policy::{PolicySet, RateLimitPolicy};
use super::store::{QuotaStore, StoreError};

/// Default bound on a single store call before it is treated as unavailable
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,

    /// Requests left in the current window (0 when denied)
    pub remaining: u32,

    /// When the quota resets. Computed relative to the current request, not
    /// to the window start, so it drifts later inside a window; clients only
    /// ever see a reset time that is not earlier than the true one.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Create an allowed decision
    pub fn allowed(remaining: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_at,
        }
    }

    /// Create a denied decision
    pub fn denied(reset_at: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_at,
        }
    }
}

/// Errors surfaced by the limiter to its caller
///
/// Store failures are absorbed (fail-open) and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    /// Policy name not registered at startup
    #[error("unknown rate limit policy: {0}")]
    UnknownPolicy(String),
}

/// Identifier-scoped rate limiter over a shared quota store
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
    policies: PolicySet,
    store_timeout: Duration,
}

impl RateLimiter {
    /// Create a limiter over the given store and policy registry
    pub fn new(store: Arc<dyn QuotaStore>, policies: PolicySet) -> Self {
        Self {
            store,
            policies,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }

    /// Override the store-call time bound
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Check whether `identifier` may make another request under the named policy
    ///
    /// Fails open: if the quota store is unreachable or times out, the request
    /// is allowed with a full remaining quota and the outage is logged. A
    /// limiter outage must never become a denial of service.
    pub async fn check(
        &self,
        identifier: &str,
        policy_name: &str,
    ) -> Result<RateLimitDecision, LimitError> {
        let policy = self
            .policies
            .get(policy_name)
            .ok_or_else(|| LimitError::UnknownPolicy(policy_name.to_string()))?;

        let key = format!("rate_limit:{policy_name}:{identifier}");

        let count = match self.bounded(self.store.increment(&key)).await {
            Ok(count) => count,
            Err(err) => {
                warn!(policy = policy_name, identifier, error = %err,
                    "quota store failure, failing open");
                return Ok(Self::fail_open(policy));
            }
        };

        // Count of 1 means the counter was just created: start the window now.
        if count == 1 {
            if let Err(err) = self.bounded(self.store.expire(&key, policy.window())).await {
                warn!(policy = policy_name, identifier, error = %err,
                    "quota store failure setting expiry, failing open");
                return Ok(Self::fail_open(policy));
            }
        }

        let reset_at = Utc::now() + chrono::Duration::seconds(policy.window_secs as i64);
        let count = u32::try_from(count).unwrap_or(u32::MAX);

        if count <= policy.max_requests {
            Ok(RateLimitDecision::allowed(
                policy.max_requests - count,
                reset_at,
            ))
        } else {
            Ok(RateLimitDecision::denied(reset_at))
        }
    }

    fn fail_open(policy: &RateLimitPolicy) -> RateLimitDecision {
        RateLimitDecision::allowed(policy.max_requests, Utc::now())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout.as_millis() as u64)),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policies", &self.policies)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::policy::{API_REQUESTS, PASSWORD_RESET};
    use crate::rate_limit::store::InMemoryQuotaStore;
    use async_trait::async_trait;

    /// Store that always reports an outage
    struct UnavailableStore;

    #[async_trait]
    impl QuotaStore for UnavailableStore {
        async fn increment(&self, _key: &str) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    /// Store whose calls never complete
    struct HangingStore;

    #[async_trait]
    impl QuotaStore for HangingStore {
        async fn increment(&self, _key: &str) -> Result<u64, StoreError> {
            std::future::pending().await
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(InMemoryQuotaStore::new()), PolicySet::default())
    }

    #[tokio::test]
    async fn test_password_reset_scenario() {
        let limiter = limiter();
        let ip = "203.0.113.5";

        let first = limiter.check(ip, PASSWORD_RESET).await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 2);

        let second = limiter.check(ip, PASSWORD_RESET).await.unwrap();
        assert!(second.allowed);
        assert_eq!(second.remaining, 1);

        let third = limiter.check(ip, PASSWORD_RESET).await.unwrap();
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.check(ip, PASSWORD_RESET).await.unwrap();
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
    }

    #[tokio::test]
    async fn test_remaining_never_increases_within_window() {
        let limiter = limiter();
        let mut previous = u32::MAX;

        for _ in 0..10 {
            let decision = limiter.check("10.0.0.1", API_REQUESTS).await.unwrap();
            assert!(decision.allowed);
            assert!(decision.remaining < previous);
            previous = decision.remaining;
        }
    }

    #[tokio::test]
    async fn test_identifiers_do_not_share_quota() {
        let limiter = limiter();

        for _ in 0..3 {
            limiter.check("198.51.100.1", PASSWORD_RESET).await.unwrap();
        }
        assert!(!limiter
            .check("198.51.100.1", PASSWORD_RESET)
            .await
            .unwrap()
            .allowed);

        // A different caller is unaffected
        let other = limiter.check("198.51.100.2", PASSWORD_RESET).await.unwrap();
        assert!(other.allowed);
        assert_eq!(other.remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expiry_resets_quota() {
        let limiter = limiter();

        for _ in 0..3 {
            limiter.check("10.1.1.1", PASSWORD_RESET).await.unwrap();
        }
        assert!(!limiter
            .check("10.1.1.1", PASSWORD_RESET)
            .await
            .unwrap()
            .allowed);

        tokio::time::advance(Duration::from_secs(3601)).await;

        let fresh = limiter.check("10.1.1.1", PASSWORD_RESET).await.unwrap();
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
    }

    #[tokio::test]
    async fn test_fail_open_on_store_outage() {
        let limiter = RateLimiter::new(Arc::new(UnavailableStore), PolicySet::default());

        // Every call is allowed with a full quota, regardless of history
        for _ in 0..10 {
            let decision = limiter.check("10.0.0.9", PASSWORD_RESET).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_open_on_store_timeout() {
        let limiter = RateLimiter::new(Arc::new(HangingStore), PolicySet::default())
            .with_store_timeout(Duration::from_millis(50));

        let decision = limiter.check("10.0.0.9", API_REQUESTS).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 100);
    }

    #[tokio::test]
    async fn test_unknown_policy_is_an_error() {
        let limiter = limiter();
        let err = limiter.check("10.0.0.1", "no_such_policy").await.unwrap_err();
        assert!(matches!(err, LimitError::UnknownPolicy(name) if name == "no_such_policy"));
    }

    #[tokio::test]
    async fn test_reset_at_is_in_the_future() {
        let limiter = limiter();
        let before = Utc::now();
        let decision = limiter.check("10.0.0.1", PASSWORD_RESET).await.unwrap();
        assert!(decision.reset_at >= before + chrono::Duration::seconds(3599));
    }
}
