//! Roles
//!
//! The fixed set of user categories the dashboard recognizes. Kebab-case is
//! the canonical wire form; parsing also accepts snake_case so stored profiles
//! written either way resolve to the same variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user's role, determining permitted actions and viewable routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Oversees day-to-day transactions and approvals
    Supervisor,
    /// Handles physical receipt and issuance of stock
    Storeman,
    /// Records transactions
    Clerk,
    /// Owns stock levels and transfers
    InventoryManager,
    /// Owns storerooms and high-level flows
    WarehouseManager,
    /// Reviews analytics and financial reports
    FinancialController,
}

impl Role {
    /// Every recognized role
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Supervisor,
        Role::Storeman,
        Role::Clerk,
        Role::InventoryManager,
        Role::WarehouseManager,
        Role::FinancialController,
    ];

    /// Canonical string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Storeman => "storeman",
            Role::Clerk => "clerk",
            Role::InventoryManager => "inventory-manager",
            Role::WarehouseManager => "warehouse-manager",
            Role::FinancialController => "financial-controller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role string outside the recognized set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "storeman" => Ok(Role::Storeman),
            "clerk" => Ok(Role::Clerk),
            "inventory-manager" | "inventory_manager" => Ok(Role::InventoryManager),
            "warehouse-manager" | "warehouse_manager" => Ok(Role::WarehouseManager),
            "financial-controller" | "financial_controller" => Ok(Role::FinancialController),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
