//! Service wiring and the authentication flows.
//!
//! Registration and login are the two flows that legitimately run without a
//! bound tenant context: registration creates the tenant it then binds to,
//! and login looks a user up by email before any tenant is known.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use spendtrack_auth::{
    AuthConfig, AuthError, Role, User, hash_password, issue_token, user::normalize_email,
    verify_password,
};
use spendtrack_core::{DomainError, TenantId, UserId};
use spendtrack_expenses::{Category, Expense};
use spendtrack_infra::{
    InMemoryRecordStore, InMemoryTenantDirectory, InMemoryUserDirectory, PgCategoryStore,
    PgExpenseStore, PgTenantDirectory, PgUserDirectory, ScopedRepository, StoreError,
    TenantDirectory, UserDirectory,
};
use spendtrack_tenancy::{Tenant, TenancyError, TenantContext};

/// Default categories seeded for every new tenant.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Travel", "#3B82F6"),
    ("Food", "#10B981"),
    ("Office Supplies", "#F59E0B"),
    ("Software", "#8B5CF6"),
    ("Other", "#6B7280"),
];

/// Anything a service flow can fail with; the HTTP layer maps each variant
/// family to a distinct caller-visible outcome.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tenancy(#[from] TenancyError),
}

/// Input for tenant self-registration.
pub struct RegisterTenantInput {
    pub company_name: String,
    pub subdomain: String,
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub password: String,
}

/// Input for inviting a user into the active tenant.
pub struct InviteUserInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub token: String,
    pub user: User,
}

/// Application services: config plus the only data-access surfaces handlers
/// ever see. The raw stores are consumed right here at wiring time.
pub struct AppServices {
    pub config: AuthConfig,
    pub tenants: Arc<dyn TenantDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub expenses: ScopedRepository<Expense>,
    pub categories: ScopedRepository<Category>,
}

impl AppServices {
    /// In-memory stores (tests/dev).
    pub fn in_memory(config: AuthConfig) -> Self {
        Self {
            config,
            tenants: Arc::new(InMemoryTenantDirectory::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
            expenses: ScopedRepository::new(Arc::new(InMemoryRecordStore::<Expense>::new())),
            categories: ScopedRepository::new(Arc::new(InMemoryRecordStore::<Category>::new())),
        }
    }

    /// Postgres-backed stores.
    pub async fn postgres(database_url: &str, config: AuthConfig) -> anyhow::Result<Self> {
        let pool = sqlx::PgPool::connect(database_url).await?;
        Ok(Self {
            config,
            tenants: Arc::new(PgTenantDirectory::new(pool.clone())),
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            expenses: ScopedRepository::new(Arc::new(PgExpenseStore::new(pool.clone()))),
            categories: ScopedRepository::new(Arc::new(PgCategoryStore::new(pool))),
        })
    }

    /// Register a new tenant with its owner account and default categories,
    /// returning a ready-to-use session.
    pub async fn register_tenant(
        &self,
        input: RegisterTenantInput,
    ) -> Result<AuthenticatedSession, ServiceError> {
        let now = Utc::now();

        let tenant = Tenant::register(
            &input.company_name,
            &input.subdomain,
            &input.owner_email,
            now,
        )?;

        if self
            .tenants
            .find_by_subdomain(&tenant.subdomain)
            .await?
            .is_some()
        {
            return Err(StoreError::Conflict(format!(
                "subdomain '{}' already exists",
                tenant.subdomain
            ))
            .into());
        }

        let email = normalize_email(&input.owner_email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(StoreError::Conflict("email already registered".to_string()).into());
        }

        let password_hash = hash_on_blocking_pool(input.password).await?;

        self.tenants.insert(tenant.clone()).await?;

        // Fresh unit-of-work context, bound now that the tenant exists.
        let ctx = TenantContext::new();
        ctx.bind(tenant.id)?;

        let owner = User::new(
            tenant.id,
            &email,
            password_hash,
            &input.owner_first_name,
            &input.owner_last_name,
            Role::Owner,
            now,
        )?;
        self.users.insert(owner.clone()).await?;

        for (name, color) in DEFAULT_CATEGORIES {
            let category =
                Category::create(tenant.id, name, None, Some((*color).to_string()), now)?;
            self.categories.create(&ctx, category, now).await?;
        }

        tracing::info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "tenant registered");

        let token = issue_token(owner.id, tenant.id, owner.role, now, &self.config)?;
        Ok(AuthenticatedSession { token, user: owner })
    }

    /// Authenticate by email/password.
    ///
    /// Unknown email and wrong password produce the identical
    /// `InvalidCredentials` answer; inactive tenant/user are distinct (those
    /// are not secrets).
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, ServiceError> {
        let now = Utc::now();

        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let Some(mut user) = self.users.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };

        let Some(tenant) = self.tenants.find(user.tenant_id).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !tenant.is_active {
            return Err(AuthError::InactiveTenant.into());
        }
        if !user.is_active {
            return Err(AuthError::InactiveUser.into());
        }

        let verified =
            verify_on_blocking_pool(password.to_string(), user.password_hash.clone()).await?;
        if !verified {
            return Err(AuthError::InvalidCredentials.into());
        }

        user.record_login(now);
        self.users.update(user.clone()).await?;

        let token = issue_token(user.id, user.tenant_id, user.role, now, &self.config)?;
        Ok(AuthenticatedSession { token, user })
    }

    /// Invite a user into the tenant, enforcing the seat quota. Creating a
    /// second Owner is refused (one Owner per tenant by convention).
    pub async fn invite_user(
        &self,
        tenant_id: TenantId,
        input: InviteUserInput,
    ) -> Result<User, ServiceError> {
        let now = Utc::now();

        if input.role == Role::Owner {
            return Err(DomainError::validation("cannot invite a second owner").into());
        }

        let tenant = self
            .tenants
            .find(tenant_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        let seats_used = self.users.count_for_tenant(tenant_id).await?;
        if seats_used >= tenant.max_users {
            return Err(StoreError::Conflict(format!(
                "user limit reached ({} seats)",
                tenant.max_users
            ))
            .into());
        }

        let password_hash = hash_on_blocking_pool(input.password).await?;
        let user = User::new(
            tenant_id,
            &input.email,
            password_hash,
            &input.first_name,
            &input.last_name,
            input.role,
            now,
        )?;
        self.users.insert(user.clone()).await?;
        Ok(user)
    }

    /// Change the caller's own password after verifying the current one.
    pub async fn change_password(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), ServiceError> {
        let Some(mut user) = self.users.find_in_tenant(tenant_id, user_id).await? else {
            return Err(StoreError::NotFound.into());
        };

        let verified =
            verify_on_blocking_pool(current.to_string(), user.password_hash.clone()).await?;
        if !verified {
            return Err(AuthError::InvalidCredentials.into());
        }

        user.password_hash = hash_on_blocking_pool(new.to_string()).await?;
        self.users.update(user).await?;
        Ok(())
    }
}

/// Run the deliberately expensive KDF off the async runtime so login bursts
/// cannot starve unrelated requests.
async fn hash_on_blocking_pool(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| StoreError::Backend(format!("hashing task failed: {e}")).into())
}

async fn verify_on_blocking_pool(password: String, artifact: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &artifact))
        .await
        .map_err(|e| StoreError::Backend(format!("hashing task failed: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services() -> AppServices {
        AppServices::in_memory(AuthConfig {
            jwt_secret: "test-secret".into(),
            token_lifetime_secs: 900,
            issuer: "spendtrack-test".into(),
        })
    }

    fn acme_registration() -> RegisterTenantInput {
        RegisterTenantInput {
            company_name: "Acme Corp".into(),
            subdomain: "acme".into(),
            owner_email: "owner@acme.io".into(),
            owner_first_name: "Ada".into(),
            owner_last_name: "Lovelace".into(),
            password: "Secret123!".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();
        assert_eq!(session.user.role, Role::Owner);
        assert_eq!(session.user.email, "owner@acme.io");

        let login = services.login("owner@acme.io", "Secret123!").await.unwrap();
        assert_eq!(login.user.id, session.user.id);
        assert!(login.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn registration_seeds_default_categories_under_the_new_tenant() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();

        let ctx = TenantContext::bound(session.user.tenant_id);
        let categories = services.categories.list(&ctx).await.unwrap();
        assert_eq!(categories.len(), 5);
        assert!(
            categories
                .iter()
                .all(|c| c.tenant_id == session.user.tenant_id)
        );
        assert!(categories.iter().any(|c| c.name == "Travel"));
    }

    #[tokio::test]
    async fn duplicate_subdomain_is_rejected() {
        let services = services();
        services.register_tenant(acme_registration()).await.unwrap();

        let mut second = acme_registration();
        second.owner_email = "other@acme.io".into();
        let result = services.register_tenant(second).await;
        assert!(matches!(
            result,
            Err(ServiceError::Store(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let services = services();
        services.register_tenant(acme_registration()).await.unwrap();

        let wrong_password = services.login("owner@acme.io", "nope").await.unwrap_err();
        let unknown_email = services.login("ghost@acme.io", "nope").await.unwrap_err();

        let as_message = |e: ServiceError| match e {
            ServiceError::Auth(a) => a.to_string(),
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(as_message(wrong_password), as_message(unknown_email));
    }

    #[tokio::test]
    async fn login_into_deactivated_tenant_is_rejected_distinctly() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();

        services
            .tenants
            .set_active(session.user.tenant_id, false)
            .await
            .unwrap();

        let err = services.login("owner@acme.io", "Secret123!").await;
        assert!(matches!(
            err,
            Err(ServiceError::Auth(AuthError::InactiveTenant))
        ));
    }

    #[tokio::test]
    async fn login_as_deactivated_user_is_rejected_distinctly() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();

        let mut user = session.user.clone();
        user.is_active = false;
        services.users.update(user).await.unwrap();

        let err = services.login("owner@acme.io", "Secret123!").await;
        assert!(matches!(
            err,
            Err(ServiceError::Auth(AuthError::InactiveUser))
        ));
    }

    #[tokio::test]
    async fn invite_respects_seat_quota() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();
        let tenant_id = session.user.tenant_id;

        // Free plan allows 5 seats; the owner occupies one.
        for i in 0..4 {
            services
                .invite_user(
                    tenant_id,
                    InviteUserInput {
                        email: format!("user{i}@acme.io"),
                        password: "Secret123!".into(),
                        first_name: "User".into(),
                        last_name: format!("{i}"),
                        role: Role::Base,
                    },
                )
                .await
                .unwrap();
        }

        let over_quota = services
            .invite_user(
                tenant_id,
                InviteUserInput {
                    email: "overflow@acme.io".into(),
                    password: "Secret123!".into(),
                    first_name: "One".into(),
                    last_name: "TooMany".into(),
                    role: Role::Base,
                },
            )
            .await;
        assert!(matches!(
            over_quota,
            Err(ServiceError::Store(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn inviting_a_second_owner_is_refused() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();

        let result = services
            .invite_user(
                session.user.tenant_id,
                InviteUserInput {
                    email: "usurper@acme.io".into(),
                    password: "Secret123!".into(),
                    first_name: "U".into(),
                    last_name: "Surper".into(),
                    role: Role::Owner,
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Domain(_))));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let services = services();
        let session = services.register_tenant(acme_registration()).await.unwrap();
        let tenant_id = session.user.tenant_id;
        let user_id = session.user.id;

        let wrong = services
            .change_password(tenant_id, user_id, "nope", "NewSecret1!")
            .await;
        assert!(matches!(
            wrong,
            Err(ServiceError::Auth(AuthError::InvalidCredentials))
        ));

        services
            .change_password(tenant_id, user_id, "Secret123!", "NewSecret1!")
            .await
            .unwrap();

        services.login("owner@acme.io", "NewSecret1!").await.unwrap();
        assert!(services.login("owner@acme.io", "Secret123!").await.is_err());
    }
}
