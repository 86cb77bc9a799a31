//! Authorization Service
//!
//! Single source of truth for role-permission checks. The `guard` wrappers are
//! the sole enforcement point for privileged operations: callers hand the
//! operation to the service instead of invoking it directly.

use std::collections::BTreeSet;
use std::future::Future;
use tracing::warn;

use super::catalog::{permissions_for, Permission};
use super::role::Role;

/// Authorization failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Role string outside the recognized set
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Valid role lacking the required permission
    #[error("role '{role}' is not permitted to {action} {resource}")]
    Unauthorized {
        role: Role,
        action: String,
        resource: String,
    },
}

/// Stateless facade over the permission catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationService;

impl AuthorizationService {
    /// Create the service
    pub fn new() -> Self {
        Self
    }

    /// True iff the role's permission set contains exactly (action, resource)
    pub fn has_permission(&self, role: Role, action: &str, resource: &str) -> bool {
        permissions_for(role)
            .iter()
            .any(|p| p.action == action && p.resource == resource)
    }

    /// All actions the role may perform on the resource
    pub fn allowed_actions(&self, role: Role, resource: &str) -> BTreeSet<&'static str> {
        permissions_for(role)
            .iter()
            .filter(|p| p.resource == resource)
            .map(|p| p.action)
            .collect()
    }

    /// Validate a role name and check the permission
    ///
    /// Returns `InvalidRole` for unrecognized role strings. A false result is
    /// logged as a security-relevant warning, not an error.
    pub fn validate_action(
        &self,
        role: &str,
        action: &str,
        resource: &str,
    ) -> Result<bool, AuthzError> {
        let role: Role = role
            .parse()
            .map_err(|err: super::role::UnknownRole| AuthzError::InvalidRole(err.0))?;

        let allowed = self.has_permission(role, action, resource);
        if !allowed {
            warn!(%role, action, resource, "permission denied");
        }
        Ok(allowed)
    }

    /// Run `op` only if the role holds the permission
    ///
    /// On denial the operation is never invoked and `Unauthorized` names the
    /// refused combination. On success the operation's output is returned
    /// unchanged (a fallible operation returns its own `Result` as `T`).
    pub fn guard<T, F>(
        &self,
        role: Role,
        action: &str,
        resource: &str,
        op: F,
    ) -> Result<T, AuthzError>
    where
        F: FnOnce() -> T,
    {
        self.require(role, action, resource)?;
        Ok(op())
    }

    /// Async counterpart of [`guard`](Self::guard)
    pub async fn guard_async<T, F, Fut>(
        &self,
        role: Role,
        action: &str,
        resource: &str,
        op: F,
    ) -> Result<T, AuthzError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.require(role, action, resource)?;
        Ok(op().await)
    }

    fn require(&self, role: Role, action: &str, resource: &str) -> Result<(), AuthzError> {
        if self.has_permission(role, action, resource) {
            Ok(())
        } else {
            warn!(%role, action, resource, "permission denied");
            Err(AuthzError::Unauthorized {
                role,
                action: action.to_string(),
                resource: resource.to_string(),
            })
        }
    }

    /// The permission set for a role (read-only view of the catalog)
    pub fn permissions(&self, role: Role) -> &'static std::collections::HashSet<Permission> {
        permissions_for(role)
    }
}
