//! `spendtrack-auth` — pure authentication/credential boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod config;
pub mod error;
pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use config::AuthConfig;
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use roles::Role;
pub use token::{Claims, issue_token, verify_token};
pub use user::User;
