use core::str::FromStr;

use serde::{Deserialize, Serialize};

use spendtrack_core::DomainError;

/// User role within a tenant.
///
/// Roles form an ordered privilege ladder; the derived `Ord` follows
/// declaration order, so `Role::Base < Role::Manager < Role::Admin <
/// Role::Owner` and gating checks read as plain comparisons.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular member: submits and manages their own expenses.
    #[default]
    Base,
    /// Can approve/reject expenses of other users.
    Manager,
    /// Can manage categories and users.
    Admin,
    /// Tenant owner; exactly one per tenant by convention.
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Base => "base",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Role::Base),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}
