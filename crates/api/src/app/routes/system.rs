use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use spendtrack_tenancy::TenantContext;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(ctx): Extension<Arc<TenantContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": ctx.current().map(|t| t.to_string()),
        "user_id": principal.user_id().to_string(),
        "role": principal.role().as_str(),
    }))
}
