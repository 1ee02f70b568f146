//! Tenant resolution middleware.
//!
//! Runs once per inbound request, before any handler: verifies the bearer
//! token and populates a fresh [`TenantContext`] from its tenant claim. The
//! claim is the only trusted source of tenant identity — nothing read from
//! the body, query, or other headers ever reaches the context.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use spendtrack_auth::{AuthConfig, verify_token};
use spendtrack_tenancy::TenantContext;

use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let claims = verify_token(token, Utc::now(), &state.config).map_err(|e| {
        tracing::debug!(error = %e, "rejected identity assertion");
        StatusCode::UNAUTHORIZED
    })?;

    let ctx = Arc::new(TenantContext::bound(claims.tenant_id));
    req.extensions_mut().insert(ctx);
    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.role));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
