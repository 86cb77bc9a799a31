//! Rate Limit Policies
//!
//! Named, immutable rate-limit rules looked up by the limiter at check time.
//! Policies are defined at process start (defaults below, overridable through
//! configuration) and never change afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Policy name for login attempts
pub const AUTH_ATTEMPTS: &str = "auth_attempts";
/// Policy name for password-reset requests
pub const PASSWORD_RESET: &str = "password_reset";
/// Policy name for generic API calls
pub const API_REQUESTS: &str = "api_requests";

/// Default limits
pub const DEFAULT_AUTH_ATTEMPT_LIMIT: u32 = 5; // per 15 minutes
pub const DEFAULT_AUTH_ATTEMPT_WINDOW_SECS: u64 = 15 * 60;
pub const DEFAULT_PASSWORD_RESET_LIMIT: u32 = 3; // per hour
pub const DEFAULT_PASSWORD_RESET_WINDOW_SECS: u64 = 60 * 60;
pub const DEFAULT_API_REQUEST_LIMIT: u32 = 100; // per 15 minutes
pub const DEFAULT_API_REQUEST_WINDOW_SECS: u64 = 15 * 60;

/// A named rate-limit rule: at most `max_requests` within one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed within one window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitPolicy {
    /// Create a new policy
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    /// Window length as a `Duration`
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Registry of named policies, built once at startup
#[derive(Debug, Clone)]
pub struct PolicySet {
    policies: HashMap<String, RateLimitPolicy>,
}

impl Default for PolicySet {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            AUTH_ATTEMPTS.to_string(),
            RateLimitPolicy::new(DEFAULT_AUTH_ATTEMPT_LIMIT, DEFAULT_AUTH_ATTEMPT_WINDOW_SECS),
        );
        policies.insert(
            PASSWORD_RESET.to_string(),
            RateLimitPolicy::new(
                DEFAULT_PASSWORD_RESET_LIMIT,
                DEFAULT_PASSWORD_RESET_WINDOW_SECS,
            ),
        );
        policies.insert(
            API_REQUESTS.to_string(),
            RateLimitPolicy::new(DEFAULT_API_REQUEST_LIMIT, DEFAULT_API_REQUEST_WINDOW_SECS),
        );
        Self { policies }
    }
}

impl PolicySet {
    /// Create a registry with the default policies
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry (for tests and custom setups)
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Insert or replace a named policy, consuming and returning self
    pub fn with_policy(mut self, name: &str, policy: RateLimitPolicy) -> Self {
        self.policies.insert(name.to_string(), policy);
        self
    }

    /// Look up a policy by name
    pub fn get(&self, name: &str) -> Option<&RateLimitPolicy> {
        self.policies.get(name)
    }

    /// Names of all registered policies
    pub fn names(&self) -> Vec<&str> {
        self.policies.keys().map(|k| k.as_str()).collect()
    }
}
