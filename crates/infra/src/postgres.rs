//! Postgres-backed stores and directories.
//!
//! Tenant isolation is enforced the same way as in memory: every read over a
//! tenant-scoped table carries `tenant_id` in the WHERE clause, and an unset
//! active tenant short-circuits to "nothing" without touching the database.
//!
//! Expected schema (all timestamps `timestamptz`, enums stored as text):
//!
//! ```sql
//! tenants    (id uuid PK, name text, subdomain text UNIQUE, contact_email text,
//!             is_active boolean, plan text, max_users integer, created_at)
//! users      (id uuid PK, tenant_id uuid, email text, password_hash text,
//!             first_name text, last_name text, role text, is_active boolean,
//!             created_at, last_login_at NULL, UNIQUE (tenant_id, email))
//! expenses   (id uuid PK, tenant_id uuid, user_id uuid, title text,
//!             description text NULL, amount_cents bigint, currency text,
//!             category_id uuid, expense_date, status text,
//!             receipt_url text NULL, created_at, updated_at NULL)
//! categories (id uuid PK, tenant_id uuid, name text, description text NULL,
//!             color_code text, is_active boolean, created_at, updated_at NULL)
//! ```
//!
//! SQLx unique-violation errors (code `23505`) map to [`StoreError::Conflict`];
//! everything else surfaces as [`StoreError::Backend`].

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use spendtrack_auth::{Role, User};
use spendtrack_core::{CategoryId, ExpenseId, TenantId, UserId};
use spendtrack_expenses::{Category, Expense, ExpenseStatus};
use spendtrack_tenancy::{SubscriptionPlan, Tenant};

use crate::directory::{TenantDirectory, UserDirectory};
use crate::error::StoreError;
use crate::record_store::RecordStore;

fn map_sqlx_error(op: &str, e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(format!("{op}: {}", db.message()))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::Backend(format!("{op}: {e}")),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Backend(format!("column '{name}': {e}")))
}

fn parse_enum<T>(raw: &str, what: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse()
        .map_err(|e| StoreError::Backend(format!("stored {what} is invalid: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Expenses
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgExpenseStore {
    pool: PgPool,
}

impl PgExpenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn expense_from_row(row: &PgRow) -> Result<Expense, StoreError> {
    let status: String = column(row, "status")?;
    Ok(Expense {
        id: ExpenseId::from_uuid(column(row, "id")?),
        tenant_id: TenantId::from_uuid(column(row, "tenant_id")?),
        user_id: UserId::from_uuid(column(row, "user_id")?),
        title: column(row, "title")?,
        description: column(row, "description")?,
        amount_cents: column(row, "amount_cents")?,
        currency: column(row, "currency")?,
        category_id: CategoryId::from_uuid(column(row, "category_id")?),
        expense_date: column(row, "expense_date")?,
        status: parse_enum::<ExpenseStatus>(&status, "expense status")?,
        receipt_url: column(row, "receipt_url")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

const EXPENSE_COLUMNS: &str = "id, tenant_id, user_id, title, description, amount_cents, \
     currency, category_id, expense_date, status, receipt_url, created_at, updated_at";

#[async_trait]
impl RecordStore<Expense> for PgExpenseStore {
    async fn insert(&self, record: Expense) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO expenses (id, tenant_id, user_id, title, description, amount_cents, \
             currency, category_id, expense_date, status, receipt_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(*record.id.as_uuid())
        .bind(*record.tenant_id.as_uuid())
        .bind(*record.user_id.as_uuid())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.amount_cents)
        .bind(&record.currency)
        .bind(*record.category_id.as_uuid())
        .bind(record.expense_date)
        .bind(record.status.as_str())
        .bind(&record.receipt_url)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("expenses.insert", e))?;
        Ok(())
    }

    async fn replace(&self, record: Expense) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE expenses SET user_id = $2, title = $3, description = $4, \
             amount_cents = $5, currency = $6, category_id = $7, expense_date = $8, \
             status = $9, receipt_url = $10, created_at = $11, updated_at = $12 \
             WHERE id = $1 AND tenant_id = $13",
        )
        .bind(*record.id.as_uuid())
        .bind(*record.user_id.as_uuid())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.amount_cents)
        .bind(&record.currency)
        .bind(*record.category_id.as_uuid())
        .bind(record.expense_date)
        .bind(record.status.as_str())
        .bind(&record.receipt_url)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(*record.tenant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("expenses.replace", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get(
        &self,
        active: Option<TenantId>,
        id: ExpenseId,
    ) -> Result<Option<Expense>, StoreError> {
        let Some(tenant) = active else {
            return Ok(None);
        };

        let row = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(*id.as_uuid())
        .bind(*tenant.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("expenses.get", e))?;

        row.as_ref().map(expense_from_row).transpose()
    }

    async fn list(&self, active: Option<TenantId>) -> Result<Vec<Expense>, StoreError> {
        let Some(tenant) = active else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE tenant_id = $1 \
             ORDER BY expense_date DESC"
        ))
        .bind(*tenant.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("expenses.list", e))?;

        rows.iter().map(expense_from_row).collect()
    }

    async fn remove(&self, active: Option<TenantId>, id: ExpenseId) -> Result<bool, StoreError> {
        let Some(tenant) = active else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND tenant_id = $2")
            .bind(*id.as_uuid())
            .bind(*tenant.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("expenses.remove", e))?;

        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    Ok(Category {
        id: CategoryId::from_uuid(column(row, "id")?),
        tenant_id: TenantId::from_uuid(column(row, "tenant_id")?),
        name: column(row, "name")?,
        description: column(row, "description")?,
        color_code: column(row, "color_code")?,
        is_active: column(row, "is_active")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

const CATEGORY_COLUMNS: &str =
    "id, tenant_id, name, description, color_code, is_active, created_at, updated_at";

#[async_trait]
impl RecordStore<Category> for PgCategoryStore {
    async fn insert(&self, record: Category) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO categories (id, tenant_id, name, description, color_code, \
             is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*record.id.as_uuid())
        .bind(*record.tenant_id.as_uuid())
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.color_code)
        .bind(record.is_active)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("categories.insert", e))?;
        Ok(())
    }

    async fn replace(&self, record: Category) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE categories SET name = $2, description = $3, color_code = $4, \
             is_active = $5, created_at = $6, updated_at = $7 \
             WHERE id = $1 AND tenant_id = $8",
        )
        .bind(*record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.color_code)
        .bind(record.is_active)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(*record.tenant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("categories.replace", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get(
        &self,
        active: Option<TenantId>,
        id: CategoryId,
    ) -> Result<Option<Category>, StoreError> {
        let Some(tenant) = active else {
            return Ok(None);
        };

        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(*id.as_uuid())
        .bind(*tenant.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("categories.get", e))?;

        row.as_ref().map(category_from_row).transpose()
    }

    async fn list(&self, active: Option<TenantId>) -> Result<Vec<Category>, StoreError> {
        let Some(tenant) = active else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE tenant_id = $1 ORDER BY name"
        ))
        .bind(*tenant.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("categories.list", e))?;

        rows.iter().map(category_from_row).collect()
    }

    async fn remove(&self, active: Option<TenantId>, id: CategoryId) -> Result<bool, StoreError> {
        let Some(tenant) = active else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND tenant_id = $2")
            .bind(*id.as_uuid())
            .bind(*tenant.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("categories.remove", e))?;

        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tenant directory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn tenant_from_row(row: &PgRow) -> Result<Tenant, StoreError> {
    let plan: String = column(row, "plan")?;
    let max_users: i32 = column(row, "max_users")?;
    Ok(Tenant {
        id: TenantId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        subdomain: column(row, "subdomain")?,
        contact_email: column(row, "contact_email")?,
        is_active: column(row, "is_active")?,
        plan: parse_enum::<SubscriptionPlan>(&plan, "subscription plan")?,
        max_users: max_users as u32,
        created_at: column(row, "created_at")?,
    })
}

const TENANT_COLUMNS: &str =
    "id, name, subdomain, contact_email, is_active, plan, max_users, created_at";

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn insert(&self, tenant: Tenant) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tenants (id, name, subdomain, contact_email, is_active, plan, \
             max_users, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*tenant.id.as_uuid())
        .bind(&tenant.name)
        .bind(&tenant.subdomain)
        .bind(&tenant.contact_email)
        .bind(tenant.is_active)
        .bind(tenant.plan.as_str())
        .bind(tenant.max_users as i32)
        .bind(tenant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("tenants.insert", e))?;
        Ok(())
    }

    async fn find(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("tenants.find", e))?;

        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE subdomain = $1"
        ))
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("tenants.find_by_subdomain", e))?;

        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn set_active(&self, id: TenantId, active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE tenants SET is_active = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("tenants.set_active", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User directory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = column(row, "role")?;
    Ok(User {
        id: UserId::from_uuid(column(row, "id")?),
        tenant_id: TenantId::from_uuid(column(row, "tenant_id")?),
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        role: parse_enum::<Role>(&role, "role")?,
        is_active: column(row, "is_active")?,
        created_at: column(row, "created_at")?,
        last_login_at: column(row, "last_login_at")?,
    })
}

const USER_COLUMNS: &str = "id, tenant_id, email, password_hash, first_name, last_name, \
     role, is_active, created_at, last_login_at";

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, tenant_id, email, password_hash, first_name, last_name, \
             role, is_active, created_at, last_login_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(*user.id.as_uuid())
        .bind(*user.tenant_id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.insert", e))?;
        Ok(())
    }

    async fn find_in_tenant(
        &self,
        tenant_id: TenantId,
        id: UserId,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(*id.as_uuid())
        .bind(*tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.find_in_tenant", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("users.find_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY created_at"
        ))
        .bind(*tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.list_for_tenant", e))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn update(&self, user: User) -> Result<(), StoreError> {
        // tenant_id is part of the key, never in the SET list: a row cannot
        // be moved between tenants through this path.
        let result = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, first_name = $4, \
             last_name = $5, role = $6, is_active = $7, last_login_at = $8 \
             WHERE id = $1 AND tenant_id = $9",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(*user.tenant_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("users.update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_for_tenant(&self, tenant_id: TenantId) -> Result<u32, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE tenant_id = $1")
            .bind(*tenant_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("users.count_for_tenant", e))?;

        let n: i64 = column(&row, "n")?;
        Ok(n as u32)
    }
}
