//! Category routes. Write operations are admin and above.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use spendtrack_auth::Role;
use spendtrack_core::CategoryId;
use spendtrack_expenses::Category;
use spendtrack_tenancy::TenantContext;

use crate::app::routes::common::{require_role, require_tenant};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

/// GET /categories — active categories only.
pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
) -> axum::response::Response {
    let items = match services.categories.list(&ctx).await {
        Ok(items) => items,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items: Vec<_> = items
        .iter()
        .filter(|c| c.is_active)
        .map(dto::category_to_json)
        .collect();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// GET /categories/:id
pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.categories.get(&ctx, id).await {
        Ok(Some(category)) => {
            (StatusCode::OK, Json(dto::category_to_json(&category))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /categories — admin and above; names are unique per tenant.
pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Admin) {
        return resp;
    }
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let existing = match services.categories.list(&ctx).await {
        Ok(items) => items,
        Err(e) => return errors::store_error_to_response(e),
    };
    if existing
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(body.name.trim()))
    {
        return errors::json_error(
            StatusCode::CONFLICT,
            "conflict",
            "category with this name already exists",
        );
    }

    let now = Utc::now();
    let category = match Category::create(
        tenant_id,
        &body.name,
        body.description,
        body.color_code,
        now,
    ) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.categories.create(&ctx, category, now).await {
        Ok(stored) => {
            (StatusCode::CREATED, Json(dto::category_to_json(&stored))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PUT /categories/:id — admin and above.
pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCategoryRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Admin) {
        return resp;
    }

    let id: CategoryId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut category = match services.categories.get(&ctx, id).await {
        Ok(Some(category)) => category,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = category.update_details(body.name, body.description, body.color_code) {
        return errors::domain_error_to_response(e);
    }

    match services.categories.update(&ctx, category, Utc::now()).await {
        Ok(stored) => (StatusCode::OK, Json(dto::category_to_json(&stored))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /categories/:id — admin and above.
///
/// A category still referenced by expenses is deactivated instead of
/// removed, so existing records keep a valid reference.
pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Admin) {
        return resp;
    }

    let id: CategoryId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut category = match services.categories.get(&ctx, id).await {
        Ok(Some(category)) => category,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let referenced = match services.expenses.list(&ctx).await {
        Ok(expenses) => expenses.iter().any(|e| e.category_id == id),
        Err(e) => return errors::store_error_to_response(e),
    };

    if referenced {
        category.deactivate();
        return match services.categories.update(&ctx, category, Utc::now()).await {
            Ok(_) => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": "category deactivated because it has expenses"
                })),
            )
                .into_response(),
            Err(e) => errors::store_error_to_response(e),
        };
    }

    match services.categories.delete(&ctx, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
