use spendtrack_auth::Role;
use spendtrack_core::UserId;

/// Principal context for a request (authenticated identity + role).
///
/// Populated by the resolution middleware from verified token claims; the
/// tenant half of the request state travels separately as an
/// `Arc<TenantContext>` so downstream layers share one bind-once cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
