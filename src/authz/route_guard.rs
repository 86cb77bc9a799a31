//! Route Guard
//!
//! Decides whether the current session may view a given path. Each check runs
//! the full Checking → {Redirect, Denied, Authorized} cycle against the
//! external auth collaborator; decisions are never cached across navigations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::role::Role;

/// Path unauthenticated callers are redirected to
pub const LOGIN_PATH: &str = "/login";
/// Default location the denial view links back to
pub const DEFAULT_PATH: &str = "/dashboard";

/// Proof of authentication, supplied by the external auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user
    pub user_id: Uuid,
}

/// A user's profile, mapping the user to exactly one role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// The user's role
    pub role: Role,
}

/// Failures from the external session/profile lookups
#[derive(Debug, thiserror::Error)]
pub enum AuthLookupError {
    /// Session lookup failed
    #[error("session lookup failed: {0}")]
    Session(String),

    /// Profile lookup failed
    #[error("profile lookup failed: {0}")]
    Profile(String),

    /// No profile row for the user
    #[error("no profile found for user {0}")]
    ProfileNotFound(Uuid),
}

/// External authentication collaborator
///
/// The crate treats sessions and profiles as read-only lookups; their storage
/// and lifecycle belong to the auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any
    async fn session(&self) -> Result<Option<Session>, AuthLookupError>;

    /// Profile for a user id
    async fn profile(&self, user_id: Uuid) -> Result<Profile, AuthLookupError>;
}

/// Static path-prefix to required-roles table
///
/// Longest matching prefix wins. An empty role set means the route is open to
/// any authenticated role. Maintained independently of the permission catalog;
/// the shared [`Role`] enum keeps the two from drifting apart in spelling.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(String, Vec<Role>)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        use Role::*;
        Self::empty()
            .with_route("/dashboard", &[])
            .with_route("/transactions", &[Admin, Supervisor, Storeman, Clerk])
            .with_route("/approvals", &[Admin, Supervisor, WarehouseManager])
            .with_route("/storerooms", &[Admin, WarehouseManager, InventoryManager])
            .with_route("/analytics", &[Admin, FinancialController, WarehouseManager])
            .with_route("/settings", &[Admin])
    }
}

impl RouteTable {
    /// Create a table with the dashboard's default routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a route entry (empty roles = any authenticated role)
    pub fn with_route(mut self, path: &str, roles: &[Role]) -> Self {
        self.entries.push((path.to_string(), roles.to_vec()));
        self
    }

    /// Required roles for the longest prefix matching `path`
    pub fn required_roles(&self, path: &str) -> Option<&[Role]> {
        self.entries
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, roles)| roles.as_slice())
    }
}

/// Outcome of a route check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Not authenticated: navigate to `target` instead
    Redirect {
        /// Redirect target
        target: String,
    },
    /// Authenticated but not permitted: render the denial view in place
    Denied {
        /// Denial message shown to the user
        message: String,
        /// Location the denial view links back to
        back: String,
    },
    /// Permitted: render the protected content
    Authorized {
        /// The caller's role
        role: Role,
    },
}

/// Guards navigation to protected paths
pub struct RouteGuard {
    provider: Arc<dyn AuthProvider>,
    routes: RouteTable,
}

impl RouteGuard {
    /// Create a guard over an auth provider and route table
    pub fn new(provider: Arc<dyn AuthProvider>, routes: RouteTable) -> Self {
        Self { provider, routes }
    }

    /// Decide whether the current session may view `path`
    ///
    /// An explicitly supplied role set takes precedence over the table entry;
    /// if neither names any roles, the path is open to any authenticated role.
    pub async fn check(&self, path: &str, explicit_roles: Option<&[Role]>) -> RouteDecision {
        let session = match self.provider.session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(path, "no active session, redirecting to login");
                return RouteDecision::Redirect {
                    target: LOGIN_PATH.to_string(),
                };
            }
            Err(err) => {
                warn!(path, error = %err, "session lookup failed, redirecting to login");
                return RouteDecision::Redirect {
                    target: LOGIN_PATH.to_string(),
                };
            }
        };

        let profile = match self.provider.profile(session.user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(path, user_id = %session.user_id, error = %err,
                    "profile lookup failed, redirecting to login");
                return RouteDecision::Redirect {
                    target: LOGIN_PATH.to_string(),
                };
            }
        };

        let required = explicit_roles
            .or_else(|| self.routes.required_roles(path))
            .unwrap_or(&[]);

        if !required.is_empty() && !required.contains(&profile.role) {
            warn!(path, role = %profile.role, "route access denied");
            return RouteDecision::Denied {
                message: format!(
                    "Access denied: the {} role may not view {}",
                    profile.role, path
                ),
                back: DEFAULT_PATH.to_string(),
            };
        }

        RouteDecision::Authorized { role: profile.role }
    }
}
