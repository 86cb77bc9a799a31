//! Authorization Module
//!
//! Role-based access control for the warehouse dashboard: a static permission
//! catalog, the authorization service that answers permission queries and
//! guards privileged operations, and the route guard that decides whether a
//! session may view a given path.

pub mod catalog;
pub mod role;
pub mod route_guard;
pub mod service;

pub use catalog::{permissions_for, Permission};
pub use role::{Role, UnknownRole};
pub use route_guard::{
    AuthLookupError, AuthProvider, Profile, RouteDecision, RouteGuard, RouteTable, Session,
};
pub use service::{AuthorizationService, AuthzError};
