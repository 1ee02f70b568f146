//! Unit-of-work tenant context.
//!
//! One context is created fresh per unit of work (per request, or per
//! service-level flow such as tenant self-registration) and carried along
//! that unit's execution path — typically as an `Arc<TenantContext>` in
//! request extensions. It must never be shared process-wide across
//! concurrently executing units of work: one request's binding would leak
//! into another, and a legitimate bind could be misread as a conflict.

use std::sync::Mutex;

use spendtrack_core::TenantId;

use crate::error::TenancyError;

/// Single-write container for the active tenant of one unit of work.
///
/// "Unset" is itself a meaningful state: registration and login run before
/// any tenant is established.
#[derive(Debug, Default)]
pub struct TenantContext {
    slot: Mutex<Option<TenantId>>,
}

impl TenantContext {
    /// A fresh, unbound context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context pre-bound to `tenant_id` (gateway path).
    pub fn bound(tenant_id: TenantId) -> Self {
        Self {
            slot: Mutex::new(Some(tenant_id)),
        }
    }

    /// Bind the context to a tenant.
    ///
    /// The first call binds for the lifetime of the unit of work. Rebinding
    /// the same value is a no-op; a different value is a
    /// [`TenancyError::TenantConflict`].
    pub fn bind(&self, tenant_id: TenantId) -> Result<(), TenancyError> {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };

        match *slot {
            None => {
                *slot = Some(tenant_id);
                Ok(())
            }
            Some(bound) if bound == tenant_id => Ok(()),
            Some(bound) => Err(TenancyError::TenantConflict {
                bound,
                requested: tenant_id,
            }),
        }
    }

    /// The currently bound tenant, or `None` when unset.
    pub fn current(&self) -> Option<TenantId> {
        match self.slot.lock() {
            Ok(slot) => *slot,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_unset() {
        let ctx = TenantContext::new();
        assert_eq!(ctx.current(), None);
    }

    #[test]
    fn first_bind_sticks() {
        let ctx = TenantContext::new();
        let tenant = TenantId::new();
        ctx.bind(tenant).unwrap();
        assert_eq!(ctx.current(), Some(tenant));
    }

    #[test]
    fn rebinding_same_tenant_is_a_noop() {
        let ctx = TenantContext::new();
        let tenant = TenantId::new();
        ctx.bind(tenant).unwrap();
        ctx.bind(tenant).unwrap();
        assert_eq!(ctx.current(), Some(tenant));
    }

    #[test]
    fn rebinding_different_tenant_fails_loudly() {
        let ctx = TenantContext::new();
        let first = TenantId::new();
        let second = TenantId::new();
        ctx.bind(first).unwrap();

        let err = ctx.bind(second).unwrap_err();
        assert_eq!(
            err,
            TenancyError::TenantConflict {
                bound: first,
                requested: second
            }
        );
        // The original binding survives.
        assert_eq!(ctx.current(), Some(first));
    }

    #[test]
    fn contexts_are_independent_across_units_of_work() {
        let a = TenantContext::new();
        let b = TenantContext::new();
        a.bind(TenantId::new()).unwrap();
        assert_eq!(b.current(), None);
    }
}
