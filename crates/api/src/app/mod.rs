//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring plus the registration/login flows
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use spendtrack_auth::AuthConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Uses Postgres when `DATABASE_URL` is set, in-memory stores otherwise.
pub async fn build_app(config: AuthConfig) -> anyhow::Result<Router> {
    let services = match std::env::var("DATABASE_URL") {
        Ok(url) => AppServices::postgres(&url, config).await?,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            AppServices::in_memory(config)
        }
    };
    Ok(router_with_services(Arc::new(services)))
}

/// Assemble the router around an existing service set (tests use this with
/// in-memory stores).
pub fn router_with_services(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        config: Arc::new(services.config.clone()),
    };

    // Protected routes: tenant context resolved from the verified token
    // before any handler runs.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router())
        .merge(protected)
        .layer(Extension(services))
}
