//! Public authentication routes: tenant self-registration and login.
//!
//! These are the only flows that run without a resolved tenant context; the
//! registration flow creates the tenant it then binds to.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::services::{AppServices, RegisterTenantInput};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register_tenant))
        .route("/login", post(login))
}

/// POST /auth/register — create a tenant, its owner account, and the default
/// category set; returns a ready-to-use session.
pub async fn register_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterTenantRequest>,
) -> axum::response::Response {
    let input = RegisterTenantInput {
        company_name: body.company_name,
        subdomain: body.subdomain,
        owner_email: body.owner_email,
        owner_first_name: body.owner_first_name,
        owner_last_name: body.owner_last_name,
        password: body.password,
    };

    match services.register_tenant(input).await {
        Ok(session) => {
            (StatusCode::CREATED, Json(dto::session_to_json(&session))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.login(&body.email, &body.password).await {
        Ok(session) => (StatusCode::OK, Json(dto::session_to_json(&session))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
