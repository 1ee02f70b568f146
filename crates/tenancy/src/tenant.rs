//! Tenant entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spendtrack_core::{DomainError, DomainResult, TenantId};

/// Subscription tier of a tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

impl core::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SubscriptionPlan {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "basic" => Ok(SubscriptionPlan::Basic),
            "pro" => Ok(SubscriptionPlan::Pro),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            other => Err(DomainError::validation(format!(
                "unknown subscription plan '{other}'"
            ))),
        }
    }
}

/// New tenants start on the Free plan with this many user seats.
const FREE_PLAN_MAX_USERS: u32 = 5;

/// An isolated customer account. All tenant-scoped data is partitioned by
/// `id`; `subdomain` is the unique routing key.
///
/// Tenants are created once at registration and deactivated (never
/// hard-deleted) by an administrative action.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub subdomain: String,
    pub contact_email: String,
    pub is_active: bool,
    pub plan: SubscriptionPlan,
    pub max_users: u32,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Register a new active tenant on the Free plan.
    pub fn register(
        name: &str,
        subdomain: &str,
        contact_email: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("tenant name cannot be empty"));
        }

        let contact_email = contact_email.trim().to_lowercase();
        if contact_email.is_empty() || !contact_email.contains('@') {
            return Err(DomainError::validation("invalid contact email"));
        }

        Ok(Self {
            id: TenantId::new(),
            name: name.trim().to_string(),
            subdomain: normalize_subdomain(subdomain)?,
            contact_email,
            is_active: true,
            plan: SubscriptionPlan::Free,
            max_users: FREE_PLAN_MAX_USERS,
            created_at: now,
        })
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }
}

/// Normalize and validate a routing subdomain: trimmed, lowercased,
/// `[a-z0-9-]` only, no leading/trailing `-`, at most 100 chars.
pub fn normalize_subdomain(raw: &str) -> DomainResult<String> {
    let subdomain = raw.trim().to_lowercase();

    if subdomain.is_empty() || subdomain.len() > 100 {
        return Err(DomainError::validation("subdomain length out of range"));
    }
    if !subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(DomainError::validation(
            "subdomain may contain only a-z, 0-9 and '-'",
        ));
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(DomainError::validation(
            "subdomain cannot start or end with '-'",
        ));
    }

    Ok(subdomain)
}
