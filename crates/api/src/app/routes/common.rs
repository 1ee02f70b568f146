use std::sync::Arc;

use axum::http::StatusCode;

use spendtrack_auth::Role;
use spendtrack_core::TenantId;
use spendtrack_tenancy::TenantContext;

use crate::app::errors;
use crate::context::PrincipalContext;

/// The bound tenant of this request.
///
/// Every protected route runs behind the resolution middleware, so an unset
/// context here is a wiring bug — surfaced as a 500, never as data access.
pub fn require_tenant(ctx: &Arc<TenantContext>) -> Result<TenantId, axum::response::Response> {
    ctx.current().ok_or_else(|| {
        tracing::error!("protected route reached without a bound tenant context");
        errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "missing_tenant_context",
            "internal error",
        )
    })
}

/// Gate a handler on a minimum role.
pub fn require_role(
    principal: &PrincipalContext,
    min: Role,
) -> Result<(), axum::response::Response> {
    if principal.role() >= min {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("requires {} role or higher", min),
        ))
    }
}
