//! Stockguard Library
//!
//! Security core for a warehouse inventory dashboard: a distributed rate
//! limiter with named policies and fail-open semantics, a static role-based
//! permission catalog with an enforcement wrapper, and a route guard that
//! consults session state before rendering protected views.

pub mod authz;
pub mod config;
pub mod rate_limit;
pub mod server;
