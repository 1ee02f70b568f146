//! `spendtrack-infra` — the single choke-point data-access layer.
//!
//! Every read and write of tenant-scoped records flows through
//! [`ScopedRepository`], which composes the tenant filter and the stamping
//! rules into each call; tenants and users go through the typed directories.
//! Raw store handles are consumed at wiring time, so no handler-visible query
//! path exists that bypasses the filter.

pub mod directory;
pub mod error;
pub mod postgres;
pub mod record_store;
pub mod scoped;

pub use directory::{
    InMemoryTenantDirectory, InMemoryUserDirectory, TenantDirectory, UserDirectory,
};
pub use error::StoreError;
pub use postgres::{PgCategoryStore, PgExpenseStore, PgTenantDirectory, PgUserDirectory};
pub use record_store::{InMemoryRecordStore, RecordStore};
pub use scoped::{ScopedRepository, tenant_filter};
