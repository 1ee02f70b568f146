//! User entity for identity management.
//!
//! A user belongs to exactly one tenant; `tenant_id` is immutable after
//! creation. The credential is stored only as a hash artifact (see
//! [`crate::password`]), never in plaintext.

use chrono::{DateTime, Utc};

use spendtrack_core::{DomainError, DomainResult, TenantId, UserId};

use crate::roles::Role;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new active user. Email is trimmed and lowercased; a value
    /// without `@` is rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        email: &str,
        password_hash: String,
        first_name: &str,
        last_name: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let email = normalize_email(email)?;

        if first_name.trim().is_empty() {
            return Err(DomainError::validation("first name cannot be empty"));
        }

        Ok(Self {
            id: UserId::new(),
            tenant_id,
            email,
            password_hash,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            role,
            is_active: true,
            created_at: now,
            last_login_at: None,
        })
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }
}

/// Trim + lowercase an email address, rejecting obviously malformed values.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new(
            TenantId::new(),
            "  Owner@Acme.IO ",
            "salt.hash".into(),
            "Ada",
            "Lovelace",
            Role::Owner,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(user.email, "owner@acme.io");
        assert!(user.is_active);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn invalid_email_is_rejected() {
        let result = User::new(
            TenantId::new(),
            "not-an-email",
            "salt.hash".into(),
            "Ada",
            "Lovelace",
            Role::Base,
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn empty_first_name_is_rejected() {
        let result = User::new(
            TenantId::new(),
            "a@b.io",
            "salt.hash".into(),
            "  ",
            "Lovelace",
            Role::Base,
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn record_login_sets_timestamp() {
        let mut user = User::new(
            TenantId::new(),
            "a@b.io",
            "salt.hash".into(),
            "Ada",
            "Lovelace",
            Role::Base,
            Utc::now(),
        )
        .unwrap();

        let at = Utc::now();
        user.record_login(at);
        assert_eq!(user.last_login_at, Some(at));
    }
}
