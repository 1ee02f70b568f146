//! User administration routes.
//!
//! Owner rows are immutable here: they can be neither demoted nor
//! deactivated, and no second Owner can be minted through these endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use spendtrack_auth::{AuthError, Role};
use spendtrack_core::UserId;
use spendtrack_tenancy::TenantContext;

use crate::app::routes::common::{require_role, require_tenant};
use crate::app::services::{AppServices, InviteUserInput, ServiceError};
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(current_user))
        .route("/invite", post(invite_user))
        .route("/change-password", put(change_password))
        .route("/:id/role", put(update_user_role))
        .route("/:id/deactivate", put(deactivate_user))
        .route("/:id/activate", put(activate_user))
}

/// GET /users — admin and above.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Admin) {
        return resp;
    }
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services.users.list_for_tenant(tenant_id).await {
        Ok(users) => {
            let items: Vec<_> = users.iter().map(dto::user_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /users/me
pub async fn current_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services
        .users
        .find_in_tenant(tenant_id, principal.user_id())
        .await
    {
        Ok(Some(user)) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /users/invite — admin and above; seat quota enforced.
pub async fn invite_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::InviteUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Admin) {
        return resp;
    }
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let role = match body.role.as_deref() {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => Role::Base,
    };

    let input = InviteUserInput {
        email: body.email,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
        role,
    };

    match services.invite_user(tenant_id, input).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /users/change-password
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services
        .change_password(
            tenant_id,
            principal.user_id(),
            &body.current_password,
            &body.new_password,
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(ServiceError::Auth(AuthError::InvalidCredentials)) => errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_current_password",
            "current password is incorrect",
        ),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /users/:id/role — owner only; Owner rows are immutable.
pub async fn update_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRoleRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Owner) {
        return resp;
    }
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let role: Role = match body.role.parse() {
        Ok(role) => role,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if role == Role::Owner {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "cannot promote to owner",
        );
    }

    let mut user = match services.users.find_in_tenant(tenant_id, id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if user.role == Role::Owner {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "cannot change owner role",
        );
    }

    user.role = role;
    match services.users.update(user).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PUT /users/:id/deactivate — admin and above; the Owner cannot be
/// deactivated.
pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_user_active(services, ctx, principal, id, false).await
}

/// PUT /users/:id/activate — admin and above.
pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_user_active(services, ctx, principal, id, true).await
}

async fn set_user_active(
    services: Arc<AppServices>,
    ctx: Arc<TenantContext>,
    principal: PrincipalContext,
    id: String,
    active: bool,
) -> axum::response::Response {
    if let Err(resp) = require_role(&principal, Role::Admin) {
        return resp;
    }
    let tenant_id = match require_tenant(&ctx) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut user = match services.users.find_in_tenant(tenant_id, id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if !active && user.role == Role::Owner {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "cannot deactivate owner",
        );
    }

    user.is_active = active;
    match services.users.update(user).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
