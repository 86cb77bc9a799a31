//! Rate Limiting Module
//!
//! This module provides identifier-scoped rate limiting with named policies
//! for authentication attempts, password-reset requests, and generic API calls.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HTTP Middleware (429)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       Rate Limiter                           │
//! │     policies: auth_attempts / password_reset /               │
//! │               api_requests                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │       Quota Store (atomic increment + expiry)        │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The limiter fails open: a store outage or timeout produces an allowed
//! decision and a warning, never a user-facing error.

pub mod limiter;
pub mod middleware;
pub mod policy;
pub mod store;

pub use limiter::{LimitError, RateLimitDecision, RateLimiter};
pub use middleware::{rate_limit_middleware, RateLimitState};
pub use policy::{PolicySet, RateLimitPolicy, API_REQUESTS, AUTH_ATTEMPTS, PASSWORD_RESET};
pub use store::{InMemoryQuotaStore, QuotaStore, StoreError};
