//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use spendtrack_auth::AuthError;
use spendtrack_core::DomainError;
use spendtrack_infra::StoreError;

use crate::app::services::ServiceError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Auth(e) => auth_error_to_response(e),
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
        // A conflicting tenant bind is a programming error; abort the unit of
        // work rather than pick a tenant.
        ServiceError::Tenancy(e) => {
            tracing::error!(error = %e, "tenant context conflict");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "tenant_conflict",
                "internal error",
            )
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        ),
        AuthError::InactiveTenant => json_error(
            StatusCode::UNAUTHORIZED,
            "inactive_tenant",
            "tenant account is inactive",
        ),
        AuthError::InactiveUser => json_error(
            StatusCode::UNAUTHORIZED,
            "inactive_user",
            "user account is inactive",
        ),
        AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "unauthenticated")
        }
        AuthError::Crypto(msg) => {
            tracing::error!(error = %msg, "crypto failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "crypto_error",
                "internal error",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized")
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::MissingTenantContext => {
            tracing::error!("tenant-scoped write reached the store layer with no bound tenant");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "missing_tenant_context",
                "internal error",
            )
        }
        StoreError::TenantIsolation(msg) => {
            tracing::error!(error = %msg, "tenant isolation violation");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "tenant_isolation",
                "internal error",
            )
        }
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store backend failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal error",
            )
        }
    }
}
