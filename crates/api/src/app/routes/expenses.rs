//! Expense routes.
//!
//! Ownership rules follow the record's submitter: non-managers may edit only
//! their own expenses; deletion requires the submitter or an admin; status
//! transitions are manager+.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;

use spendtrack_auth::Role;
use spendtrack_core::{CategoryId, ExpenseId};
use spendtrack_expenses::{Expense, ExpenseStatus, ExpenseUpdate, NewExpense};
use spendtrack_tenancy::TenantContext;

use crate::app::routes::common::{require_role, require_tenant};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_expense).get(list_expenses))
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/:id/status", patch(update_expense_status))
}

/// POST /expenses
pub async fn create_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateExpenseRequest>,
) -> axum::response::Response {
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let category_id: CategoryId = match body.category_id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // The category must exist within this tenant.
    match services.categories.get(&ctx, category_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "unknown_category", "category not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    let now = Utc::now();
    let new = NewExpense {
        user_id: principal.user_id(),
        category_id,
        title: body.title,
        description: body.description,
        amount_cents: body.amount_cents,
        currency: body.currency.unwrap_or_else(|| "USD".to_string()),
        expense_date: body.expense_date,
        receipt_url: body.receipt_url,
    };

    let expense = match Expense::create(tenant_id, new, now) {
        Ok(e) => e,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.expenses.create(&ctx, expense, now).await {
        Ok(stored) => {
            (StatusCode::CREATED, Json(dto::expense_to_json(&stored))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /expenses?status=&from=&to=
pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Query(query): Query<dto::ExpenseListQuery>,
) -> axum::response::Response {
    let status: Option<ExpenseStatus> = match query.status.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(s) => Some(s),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    let mut items = match services.expenses.list(&ctx).await {
        Ok(items) => items,
        Err(e) => return errors::store_error_to_response(e),
    };

    items.retain(|e| {
        status.is_none_or(|s| e.status == s)
            && query.from.is_none_or(|from| e.expense_date >= from)
            && query.to.is_none_or(|to| e.expense_date <= to)
    });
    items.sort_by(|a, b| b.expense_date.cmp(&a.expense_date));

    let items: Vec<_> = items.iter().map(dto::expense_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// GET /expenses/:id
pub async fn get_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ExpenseId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.expenses.get(&ctx, id).await {
        Ok(Some(expense)) => {
            (StatusCode::OK, Json(dto::expense_to_json(&expense))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "expense not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PUT /expenses/:id
pub async fn update_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateExpenseRequest>,
) -> axum::response::Response {
    let id: ExpenseId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut expense = match services.expenses.get(&ctx, id).await {
        Ok(Some(expense)) => expense,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "expense not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    // Only the submitter or a manager+ may edit.
    if expense.user_id != principal.user_id() && principal.role() < Role::Manager {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "not your expense");
    }

    let category_id = match &body.category_id {
        Some(raw) => match raw.parse::<CategoryId>() {
            Ok(id) => Some(id),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };
    if let Some(category_id) = category_id {
        match services.categories.get(&ctx, category_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "unknown_category",
                    "category not found",
                );
            }
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    let update = ExpenseUpdate {
        title: body.title,
        description: body.description,
        amount_cents: body.amount_cents,
        currency: body.currency,
        category_id,
        expense_date: body.expense_date,
        receipt_url: body.receipt_url,
    };
    if let Err(e) = expense.apply(update) {
        return errors::domain_error_to_response(e);
    }

    match services.expenses.update(&ctx, expense, Utc::now()).await {
        Ok(stored) => (StatusCode::OK, Json(dto::expense_to_json(&stored))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /expenses/:id
pub async fn delete_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ExpenseId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let expense = match services.expenses.get(&ctx, id).await {
        Ok(Some(expense)) => expense,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "expense not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if expense.user_id != principal.user_id() && principal.role() < Role::Admin {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "not your expense");
    }

    match services.expenses.delete(&ctx, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "expense not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PATCH /expenses/:id/status — manager and above.
pub async fn update_expense_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateExpenseStatusRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Manager) {
        return resp;
    }

    let id: ExpenseId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let status: ExpenseStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut expense = match services.expenses.get(&ctx, id).await {
        Ok(Some(expense)) => expense,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "expense not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    expense.set_status(status);
    match services.expenses.update(&ctx, expense, Utc::now()).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
