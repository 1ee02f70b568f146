//! `spendtrack-tenancy` — tenant boundary primitives.
//!
//! The [`TenantContext`] carries "the tenant this unit of work is scoped to";
//! [`TenantScoped`] is the stamping contract every tenant-owned record type
//! implements. Neither knows anything about HTTP or storage.

pub mod context;
pub mod error;
pub mod scoped;
pub mod tenant;

pub use context::TenantContext;
pub use error::TenancyError;
pub use scoped::TenantScoped;
pub use tenant::{SubscriptionPlan, Tenant};
