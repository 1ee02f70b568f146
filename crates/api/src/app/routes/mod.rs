use axum::{Router, routing::get};

pub mod auth;
pub mod categories;
pub mod common;
pub mod expenses;
pub mod system;
pub mod users;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/expenses", expenses::router())
        .nest("/categories", categories::router())
        .nest("/users", users::router())
}
