//! Typed directories for tenants and users.
//!
//! Tenants are global (they *are* the partition boundary); users are
//! tenant-owned and every read is tenant-keyed, with one exception:
//! [`UserDirectory::find_by_email`], the sanctioned cross-tenant lookup used
//! only by authentication — login runs before any tenant context exists.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use spendtrack_auth::User;
use spendtrack_core::{TenantId, UserId};
use spendtrack_tenancy::Tenant;

use crate::error::StoreError;

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Insert a new tenant. A duplicate subdomain (or id) is a
    /// [`StoreError::Conflict`].
    async fn insert(&self, tenant: Tenant) -> Result<(), StoreError>;

    async fn find(&self, id: TenantId) -> Result<Option<Tenant>, StoreError>;

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError>;

    /// Flip the activation flag. Tenants are never hard-deleted.
    async fn set_active(&self, id: TenantId, active: bool) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a new user. A duplicate email within the same tenant is a
    /// [`StoreError::Conflict`].
    async fn insert(&self, user: User) -> Result<(), StoreError>;

    /// Tenant-keyed lookup: a user id from another tenant is `None`.
    async fn find_in_tenant(
        &self,
        tenant_id: TenantId,
        id: UserId,
    ) -> Result<Option<User>, StoreError>;

    /// Cross-tenant lookup by normalized email. Authentication only.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<User>, StoreError>;

    /// Replace an existing user row. The owning tenant is immutable; an
    /// update that would move the row is a
    /// [`StoreError::TenantIsolation`] violation.
    async fn update(&self, user: User) -> Result<(), StoreError>;

    /// Number of users in a tenant (seat-quota checks).
    async fn count_for_tenant(&self, tenant_id: TenantId) -> Result<u32, StoreError>;
}

/// In-memory tenant directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTenantDirectory {
    rows: RwLock<HashMap<TenantId, Tenant>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn insert(&self, tenant: Tenant) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if rows.contains_key(&tenant.id) {
            return Err(StoreError::Conflict(format!(
                "tenant {} already exists",
                tenant.id
            )));
        }
        if rows.values().any(|t| t.subdomain == tenant.subdomain) {
            return Err(StoreError::Conflict(format!(
                "subdomain '{}' already exists",
                tenant.subdomain
            )));
        }

        rows.insert(tenant.id, tenant);
        Ok(())
    }

    async fn find(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows.get(&id).cloned())
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows.values().find(|t| t.subdomain == subdomain).cloned())
    }

    async fn set_active(&self, id: TenantId, active: bool) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let tenant = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        tenant.is_active = active;
        Ok(())
    }
}

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    rows: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if rows.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!(
                "user {} already exists",
                user.id
            )));
        }
        if rows
            .values()
            .any(|u| u.tenant_id == user.tenant_id && u.email == user.email)
        {
            return Err(StoreError::Conflict(format!(
                "email '{}' already exists in this tenant",
                user.email
            )));
        }

        rows.insert(user.id, user);
        Ok(())
    }

    async fn find_in_tenant(
        &self,
        tenant_id: TenantId,
        id: UserId,
    ) -> Result<Option<User>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows
            .get(&id)
            .filter(|u| u.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows.values().find(|u| u.email == email).cloned())
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<User>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows
            .values()
            .filter(|u| u.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn update(&self, user: User) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let existing = rows.get(&user.id).ok_or(StoreError::NotFound)?;
        if existing.tenant_id != user.tenant_id {
            return Err(StoreError::TenantIsolation(format!(
                "user {} cannot move between tenants",
                user.id
            )));
        }

        rows.insert(user.id, user);
        Ok(())
    }

    async fn count_for_tenant(&self, tenant_id: TenantId) -> Result<u32, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows.values().filter(|u| u.tenant_id == tenant_id).count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use spendtrack_auth::Role;

    fn tenant(subdomain: &str) -> Tenant {
        Tenant::register("Acme", subdomain, "owner@acme.io", Utc::now()).unwrap()
    }

    fn user(tenant_id: TenantId, email: &str) -> User {
        User::new(
            tenant_id,
            email,
            "salt.hash".into(),
            "Ada",
            "Lovelace",
            Role::Base,
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_subdomain_is_a_conflict() {
        let dir = InMemoryTenantDirectory::new();
        dir.insert(tenant("acme")).await.unwrap();

        let result = dir.insert(tenant("acme")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn find_by_subdomain_matches_normalized_key() {
        let dir = InMemoryTenantDirectory::new();
        let t = tenant("acme");
        let id = t.id;
        dir.insert(t).await.unwrap();

        let found = dir.find_by_subdomain("acme").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(dir.find_by_subdomain("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_active_flips_flag_without_deleting() {
        let dir = InMemoryTenantDirectory::new();
        let t = tenant("acme");
        let id = t.id;
        dir.insert(t).await.unwrap();

        dir.set_active(id, false).await.unwrap();
        let found = dir.find(id).await.unwrap().unwrap();
        assert!(!found.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_within_tenant_is_a_conflict() {
        let dir = InMemoryUserDirectory::new();
        let t = TenantId::new();
        dir.insert(user(t, "a@b.io")).await.unwrap();

        let result = dir.insert(user(t, "a@b.io")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn same_email_in_different_tenants_is_allowed() {
        let dir = InMemoryUserDirectory::new();
        dir.insert(user(TenantId::new(), "a@b.io")).await.unwrap();
        dir.insert(user(TenantId::new(), "a@b.io")).await.unwrap();
    }

    #[tokio::test]
    async fn find_in_tenant_hides_foreign_users() {
        let dir = InMemoryUserDirectory::new();
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let u = user(t2, "a@b.io");
        let id = u.id;
        dir.insert(u).await.unwrap();

        assert!(dir.find_in_tenant(t1, id).await.unwrap().is_none());
        assert!(dir.find_in_tenant(t2, id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_cannot_move_user_between_tenants() {
        let dir = InMemoryUserDirectory::new();
        let t = TenantId::new();
        let mut u = user(t, "a@b.io");
        dir.insert(u.clone()).await.unwrap();

        u.tenant_id = TenantId::new();
        let result = dir.update(u).await;
        assert!(matches!(result, Err(StoreError::TenantIsolation(_))));
    }

    #[tokio::test]
    async fn count_for_tenant_counts_only_own_users() {
        let dir = InMemoryUserDirectory::new();
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        dir.insert(user(t1, "a@b.io")).await.unwrap();
        dir.insert(user(t1, "b@b.io")).await.unwrap();
        dir.insert(user(t2, "c@b.io")).await.unwrap();

        assert_eq!(dir.count_for_tenant(t1).await.unwrap(), 2);
        assert_eq!(dir.count_for_tenant(t2).await.unwrap(), 1);
    }
}
