//! Authentication error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong password or unknown email. Deliberately a single variant so the
    /// caller-visible answer never distinguishes the two (no account
    /// enumeration).
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("tenant account is inactive")]
    InactiveTenant,

    #[error("user account is inactive")]
    InactiveUser,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("crypto failure: {0}")]
    Crypto(String),
}
