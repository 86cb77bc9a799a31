//! Permission Catalog
//!
//! The static role-to-permission mapping. The catalog is plain data built once
//! at process start and never mutated; every authorization decision in the
//! crate reduces to a lookup here.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

use super::role::Role;

/// An allowed (action, resource) pair
///
/// Matching is exact and case-sensitive; there are no wildcards and no
/// hierarchy between actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    /// Action verb, e.g. `view`
    pub action: &'static str,

    /// Resource the action applies to, e.g. `inventory`
    pub resource: &'static str,
}

impl Permission {
    /// Create a permission
    pub const fn new(action: &'static str, resource: &'static str) -> Self {
        Self { action, resource }
    }
}

/// Action verbs used by the dashboard
pub mod actions {
    pub const VIEW: &str = "view";
    pub const CREATE: &str = "create";
    pub const APPROVE: &str = "approve";
    pub const MANAGE: &str = "manage";
    pub const ISSUE: &str = "issue";
    pub const RECEIVE: &str = "receive";
    pub const TRANSFER: &str = "transfer";
    pub const EXPORT: &str = "export";
}

/// Resources the dashboard exposes
pub mod resources {
    pub const INVENTORY: &str = "inventory";
    pub const TRANSACTIONS: &str = "transactions";
    pub const APPROVALS: &str = "approvals";
    pub const STOREROOMS: &str = "storerooms";
    pub const ANALYTICS: &str = "analytics";
    pub const USERS: &str = "users";
    pub const REPORTS: &str = "reports";
}

lazy_static! {
    static ref CATALOG: HashMap<Role, HashSet<Permission>> = build_catalog();
    static ref EMPTY: HashSet<Permission> = HashSet::new();
}

/// Permission set for a role
pub fn permissions_for(role: Role) -> &'static HashSet<Permission> {
    CATALOG.get(&role).unwrap_or(&EMPTY)
}

fn build_catalog() -> HashMap<Role, HashSet<Permission>> {
    use actions::*;
    use resources::*;

    let mut catalog = HashMap::new();

    catalog.insert(
        Role::Admin,
        permission_set(&[
            (VIEW, INVENTORY),
            (MANAGE, INVENTORY),
            (ISSUE, INVENTORY),
            (RECEIVE, INVENTORY),
            (TRANSFER, INVENTORY),
            (VIEW, TRANSACTIONS),
            (CREATE, TRANSACTIONS),
            (APPROVE, TRANSACTIONS),
            (MANAGE, TRANSACTIONS),
            (VIEW, APPROVALS),
            (APPROVE, APPROVALS),
            (MANAGE, APPROVALS),
            (VIEW, STOREROOMS),
            (MANAGE, STOREROOMS),
            (VIEW, ANALYTICS),
            (EXPORT, ANALYTICS),
            (VIEW, USERS),
            (MANAGE, USERS),
            (VIEW, REPORTS),
            (EXPORT, REPORTS),
        ]),
    );

    catalog.insert(
        Role::Supervisor,
        permission_set(&[
            (VIEW, INVENTORY),
            (VIEW, TRANSACTIONS),
            (CREATE, TRANSACTIONS),
            (APPROVE, TRANSACTIONS),
            (VIEW, APPROVALS),
            (APPROVE, APPROVALS),
            (VIEW, REPORTS),
        ]),
    );

    catalog.insert(
        Role::Storeman,
        permission_set(&[
            (VIEW, INVENTORY),
            (ISSUE, INVENTORY),
            (RECEIVE, INVENTORY),
            (VIEW, TRANSACTIONS),
            (CREATE, TRANSACTIONS),
        ]),
    );

    catalog.insert(
        Role::Clerk,
        permission_set(&[
            (VIEW, INVENTORY),
            (VIEW, TRANSACTIONS),
            (CREATE, TRANSACTIONS),
        ]),
    );

    catalog.insert(
        Role::InventoryManager,
        permission_set(&[
            (VIEW, INVENTORY),
            (MANAGE, INVENTORY),
            (TRANSFER, INVENTORY),
            (VIEW, TRANSACTIONS),
            (VIEW, REPORTS),
            (EXPORT, REPORTS),
        ]),
    );

    catalog.insert(
        Role::WarehouseManager,
        permission_set(&[
            (VIEW, INVENTORY),
            (TRANSFER, INVENTORY),
            (VIEW, TRANSACTIONS),
            (VIEW, APPROVALS),
            (APPROVE, APPROVALS),
            (VIEW, STOREROOMS),
            (MANAGE, STOREROOMS),
            (VIEW, ANALYTICS),
        ]),
    );

    catalog.insert(
        Role::FinancialController,
        permission_set(&[
            (VIEW, TRANSACTIONS),
            (VIEW, APPROVALS),
            (APPROVE, APPROVALS),
            (VIEW, ANALYTICS),
            (EXPORT, ANALYTICS),
            (VIEW, REPORTS),
            (EXPORT, REPORTS),
        ]),
    );

    catalog
}

fn permission_set(pairs: &[(&'static str, &'static str)]) -> HashSet<Permission> {
    pairs
        .iter()
        .map(|&(action, resource)| Permission::new(action, resource))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_a_permission_set() {
        for role in Role::ALL {
            assert!(
                !permissions_for(role).is_empty(),
                "{role} has no permissions"
            );
        }
    }

    #[test]
    fn test_every_role_can_view_something() {
        for role in Role::ALL {
            assert!(
                permissions_for(role)
                    .iter()
                    .any(|p| p.action == actions::VIEW),
                "{role} cannot view anything"
            );
        }
    }

    #[test]
    fn test_only_admin_manages_users() {
        let manage_users = Permission::new(actions::MANAGE, resources::USERS);
        for role in Role::ALL {
            let has = permissions_for(role).contains(&manage_users);
            assert_eq!(has, role == Role::Admin, "unexpected for {role}");
        }
    }

    #[test]
    fn test_clerk_cannot_approve() {
        assert!(!permissions_for(Role::Clerk)
            .iter()
            .any(|p| p.action == actions::APPROVE));
    }

    #[test]
    fn test_storeman_issues_and_receives() {
        let set = permissions_for(Role::Storeman);
        assert!(set.contains(&Permission::new(actions::ISSUE, resources::INVENTORY)));
        assert!(set.contains(&Permission::new(actions::RECEIVE, resources::INVENTORY)));
        assert!(!set.contains(&Permission::new(actions::TRANSFER, resources::INVENTORY)));
    }
}
