//! Expense record.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spendtrack_core::{CategoryId, DomainError, DomainResult, ExpenseId, TenantId, UserId};
use spendtrack_tenancy::TenantScoped;

/// Workflow state of an expense.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Reimbursed,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Pending => "pending",
            ExpenseStatus::Approved => "approved",
            ExpenseStatus::Rejected => "rejected",
            ExpenseStatus::Reimbursed => "reimbursed",
        }
    }
}

impl core::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExpenseStatus::Pending),
            "approved" => Ok(ExpenseStatus::Approved),
            "rejected" => Ok(ExpenseStatus::Rejected),
            "reimbursed" => Ok(ExpenseStatus::Reimbursed),
            other => Err(DomainError::validation(format!(
                "unknown expense status '{other}'"
            ))),
        }
    }
}

/// Caller-supplied fields for a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub description: Option<String>,
    /// Amount in minor units (cents); must be positive.
    pub amount_cents: i64,
    /// ISO 4217 alpha code, e.g. "USD".
    pub currency: String,
    pub expense_date: DateTime<Utc>,
    pub receipt_url: Option<String>,
}

/// An expense line item, owned by exactly one tenant.
#[derive(Debug, Clone)]
pub struct Expense {
    pub id: ExpenseId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub category_id: CategoryId,
    pub expense_date: DateTime<Utc>,
    pub status: ExpenseStatus,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Expense {
    /// Validate caller input and build a pending expense.
    ///
    /// `tenant_id` here is whatever the caller claims; the scoped write path
    /// overwrites it from the active context before the record is stored.
    pub fn create(tenant_id: TenantId, new: NewExpense, now: DateTime<Utc>) -> DomainResult<Self> {
        if new.title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        if new.amount_cents <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        let currency = normalize_currency(&new.currency)?;

        Ok(Self {
            id: ExpenseId::new(),
            tenant_id,
            user_id: new.user_id,
            title: new.title.trim().to_string(),
            description: new.description,
            amount_cents: new.amount_cents,
            currency,
            category_id: new.category_id,
            expense_date: new.expense_date,
            status: ExpenseStatus::Pending,
            receipt_url: new.receipt_url,
            created_at: now,
            updated_at: None,
        })
    }

    pub fn set_status(&mut self, status: ExpenseStatus) {
        self.status = status;
    }

    /// Apply a partial edit; absent fields are left untouched.
    pub fn apply(&mut self, update: ExpenseUpdate) -> DomainResult<()> {
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("title cannot be empty"));
            }
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(amount) = update.amount_cents {
            if amount <= 0 {
                return Err(DomainError::validation("amount must be positive"));
            }
            self.amount_cents = amount;
        }
        if let Some(currency) = update.currency {
            self.currency = normalize_currency(&currency)?;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(date) = update.expense_date {
            self.expense_date = date;
        }
        if let Some(url) = update.receipt_url {
            self.receipt_url = Some(url);
        }
        Ok(())
    }
}

/// Partial edit of an expense; `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub category_id: Option<CategoryId>,
    pub expense_date: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
}

fn normalize_currency(raw: &str) -> DomainResult<String> {
    let currency = raw.trim().to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::validation(
            "currency must be a 3-letter alpha code",
        ));
    }
    Ok(currency)
}

impl TenantScoped for Expense {
    type Id = ExpenseId;

    fn id(&self) -> ExpenseId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn assign_tenant(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = None;
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
