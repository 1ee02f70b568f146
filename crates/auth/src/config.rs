//! Authentication configuration.

/// Configuration for token issuance and verification.
///
/// The signing secret is process-wide configuration, not request state;
/// rotating it invalidates every outstanding token.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing/verification.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 3600 = 1 hour).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub issuer: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Self::default()
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 3600,
            issuer: "spendtrack".into(),
        }
    }
}
