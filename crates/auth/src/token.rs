//! Signed identity assertions (HS256 JWT).
//!
//! Signature verification is delegated to `jsonwebtoken`; the time window is
//! validated separately against a caller-supplied clock so expiry behavior is
//! deterministic and testable.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use spendtrack_core::{TenantId, UserId};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::roles::Role;

/// Claims embedded in every issued token.
///
/// Possession of a valid, unexpired, correctly signed token carrying these
/// claims is the sole authentication evidence the system accepts. The tenant
/// claim is the only trusted source of tenant identity for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — authenticated user.
    pub sub: UserId,
    /// Tenant the subject authenticated into.
    pub tenant_id: TenantId,
    /// Role granted within that tenant.
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issue a signed token for an authenticated user.
pub fn issue_token(
    user_id: UserId,
    tenant_id: TenantId,
    role: Role,
    now: DateTime<Utc>,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let issued_at = now.timestamp();
    let claims = Claims {
        sub: user_id,
        tenant_id,
        role,
        iss: config.issuer.clone(),
        iat: issued_at,
        exp: issued_at + config.token_lifetime_secs as i64,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Crypto(format!("token encode: {e}")))
}

/// Verify a token's signature, issuer, and time window.
///
/// Altering any claim invalidates the signature. Rejections never carry
/// partial trust: the caller gets claims only when everything checks out.
pub fn verify_token(
    token: &str,
    now: DateTime<Utc>,
    config: &AuthConfig,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    // Expiry is checked against the caller's clock below, not the wall clock
    // inside the decoder.
    validation.validate_exp = false;

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AuthError::TokenInvalid(e.to_string()))?;

    validate_time_window(&data.claims, now)?;
    Ok(data.claims)
}

/// Deterministically validate the claim time window.
fn validate_time_window(claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(AuthError::TokenInvalid(
            "expiry precedes issuance".to_string(),
        ));
    }
    if now < claims.iat {
        return Err(AuthError::TokenInvalid("issued in the future".to_string()));
    }
    if now >= claims.exp {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_lifetime_secs: 900,
            issuer: "spendtrack-test".into(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let config = test_config();
        let user_id = UserId::new();
        let tenant_id = TenantId::new();
        let now = Utc::now();

        let token = issue_token(user_id, tenant_id, Role::Owner, now, &config).unwrap();
        let claims = verify_token(&token, now, &config).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.tenant_id, tenant_id);
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.iss, "spendtrack-test");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let now = Utc::now();
        let token =
            issue_token(UserId::new(), TenantId::new(), Role::Base, now, &config).unwrap();

        // Flip one character in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[4] = if payload[4] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");

        assert!(matches!(
            verify_token(&tampered, now, &config),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected_even_with_valid_signature() {
        let config = test_config();
        let issued = Utc::now();
        let token =
            issue_token(UserId::new(), TenantId::new(), Role::Base, issued, &config).unwrap();

        let later = issued + Duration::seconds(config.token_lifetime_secs as i64 + 1);
        assert_eq!(
            verify_token(&token, later, &config),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn token_not_yet_valid_is_rejected() {
        let config = test_config();
        let issued = Utc::now();
        let token =
            issue_token(UserId::new(), TenantId::new(), Role::Base, issued, &config).unwrap();

        let earlier = issued - Duration::minutes(5);
        assert!(matches!(
            verify_token(&token, earlier, &config),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let now = Utc::now();
        let token =
            issue_token(UserId::new(), TenantId::new(), Role::Admin, now, &config).unwrap();

        let other = AuthConfig {
            jwt_secret: "other-secret".into(),
            ..test_config()
        };
        assert!(verify_token(&token, now, &other).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let config = test_config();
        let now = Utc::now();
        let token =
            issue_token(UserId::new(), TenantId::new(), Role::Admin, now, &config).unwrap();

        let other = AuthConfig {
            issuer: "someone-else".into(),
            ..test_config()
        };
        assert!(matches!(
            verify_token(&token, now, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }
}
