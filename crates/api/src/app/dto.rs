//! Request DTOs and JSON mapping helpers.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use spendtrack_auth::User;
use spendtrack_expenses::{Category, Expense};

use crate::app::services::AuthenticatedSession;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct RegisterTenantRequest {
    pub company_name: String,
    pub subdomain: String,
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub currency: Option<String>,
    pub category_id: String,
    pub expense_date: DateTime<Utc>,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub category_id: Option<String>,
    pub expense_date: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub color_code: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color_code: Option<String>,
}

#[derive(Deserialize)]
pub struct InviteUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "tenant_id": user.tenant_id.to_string(),
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "role": user.role.as_str(),
        "is_active": user.is_active,
        "created_at": user.created_at.to_rfc3339(),
        "last_login_at": user.last_login_at.map(|t| t.to_rfc3339()),
    })
}

pub fn session_to_json(session: &AuthenticatedSession) -> serde_json::Value {
    serde_json::json!({
        "token": session.token,
        "user": user_to_json(&session.user),
    })
}

pub fn expense_to_json(expense: &Expense) -> serde_json::Value {
    serde_json::json!({
        "id": expense.id.to_string(),
        "user_id": expense.user_id.to_string(),
        "title": expense.title,
        "description": expense.description,
        "amount_cents": expense.amount_cents,
        "currency": expense.currency,
        "category_id": expense.category_id.to_string(),
        "expense_date": expense.expense_date.to_rfc3339(),
        "status": expense.status.as_str(),
        "receipt_url": expense.receipt_url,
        "created_at": expense.created_at.to_rfc3339(),
        "updated_at": expense.updated_at.map(|t| t.to_rfc3339()),
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    serde_json::json!({
        "id": category.id.to_string(),
        "name": category.name,
        "description": category.description,
        "color_code": category.color_code,
        "is_active": category.is_active,
        "created_at": category.created_at.to_rfc3339(),
        "updated_at": category.updated_at.map(|t| t.to_rfc3339()),
    })
}
