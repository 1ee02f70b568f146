use thiserror::Error;

use spendtrack_core::TenantId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TenancyError {
    /// A unit of work tried to bind its context to a second, different
    /// tenant. This is a programming error, not a user-facing condition; the
    /// unit of work must abort rather than silently pick one tenant.
    #[error("tenant context already bound to {bound}, refusing rebind to {requested}")]
    TenantConflict {
        bound: TenantId,
        requested: TenantId,
    },
}
