//! Stamping contract for tenant-owned record types.

use chrono::{DateTime, Utc};

use spendtrack_core::TenantId;

/// A stored entity that must never be visible or writable outside its owning
/// tenant.
///
/// The owning tenant is system-assigned: the scoped write path overwrites it
/// from the active [`crate::TenantContext`] on creation and never mutates it
/// afterwards, regardless of caller-supplied values.
pub trait TenantScoped {
    /// Strongly-typed record identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    fn id(&self) -> Self::Id;

    fn tenant_id(&self) -> TenantId;

    /// Force the owning tenant. Reserved for the scoped write path.
    fn assign_tenant(&mut self, tenant_id: TenantId);

    /// The creation stamp currently carried by the record.
    fn created_at(&self) -> DateTime<Utc>;

    /// Stamp the creation timestamp and clear any update timestamp.
    fn stamp_created(&mut self, at: DateTime<Utc>);

    /// Refresh the update timestamp.
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}
