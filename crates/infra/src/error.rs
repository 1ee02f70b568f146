//! Store operation errors.
//!
//! These are **infrastructure errors** (storage, isolation, uniqueness) as
//! opposed to domain errors (validation, invariants).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Attempt to create a tenant-scoped record with no bound tenant.
    /// Rejected before reaching the store; tenant-scoped data cannot exist
    /// without an owning tenant.
    #[error("tenant-scoped write with no bound tenant context")]
    MissingTenantContext,

    /// The target row does not exist — or belongs to another tenant, which
    /// must be indistinguishable from not existing.
    #[error("not found")]
    NotFound,

    /// Unique-key conflict (duplicate subdomain, email, record id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A write would have moved a row across tenants (programming error).
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    /// Underlying storage failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}
