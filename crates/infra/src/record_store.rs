//! Storage abstraction for tenant-scoped records.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use spendtrack_core::TenantId;
use spendtrack_tenancy::TenantScoped;

use crate::error::StoreError;
use crate::scoped::tenant_filter;

/// Raw row storage for one tenant-scoped record type.
///
/// Read methods take the *active* tenant (`None` = unset context) and must
/// return nothing when it is unset or does not match — implementations apply
/// [`tenant_filter`] (in memory) or the equivalent `WHERE tenant_id = $1`
/// (SQL). Writes take fully-stamped records; stamping itself happens one
/// layer up in [`crate::ScopedRepository`], the only intended caller.
#[async_trait]
pub trait RecordStore<R>: Send + Sync
where
    R: TenantScoped,
{
    /// Insert a new row. Duplicate id is a [`StoreError::Conflict`].
    async fn insert(&self, record: R) -> Result<(), StoreError>;

    /// Replace an existing row wholesale. Missing id is
    /// [`StoreError::NotFound`].
    async fn replace(&self, record: R) -> Result<(), StoreError>;

    /// Fetch one row visible to the active tenant.
    async fn get(&self, active: Option<TenantId>, id: R::Id) -> Result<Option<R>, StoreError>;

    /// List all rows visible to the active tenant.
    async fn list(&self, active: Option<TenantId>) -> Result<Vec<R>, StoreError>;

    /// Delete one row visible to the active tenant; returns whether a row
    /// was deleted.
    async fn remove(&self, active: Option<TenantId>, id: R::Id) -> Result<bool, StoreError>;
}

/// In-memory record store for tests/dev.
///
/// Rows are keyed by record id and carry their owning tenant; isolation comes
/// from the filter applied on every read, not from the storage layout — which
/// is exactly what makes a cross-tenant lookup behave like "not found".
#[derive(Debug)]
pub struct InMemoryRecordStore<R>
where
    R: TenantScoped,
{
    rows: RwLock<HashMap<R::Id, R>>,
}

impl<R> InMemoryRecordStore<R>
where
    R: TenantScoped,
{
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> Default for InMemoryRecordStore<R>
where
    R: TenantScoped,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> RecordStore<R> for InMemoryRecordStore<R>
where
    R: TenantScoped + Clone + Send + Sync + 'static,
    R::Id: Send + 'static,
{
    async fn insert(&self, record: R) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if rows.contains_key(&record.id()) {
            return Err(StoreError::Conflict(format!(
                "record {:?} already exists",
                record.id()
            )));
        }
        rows.insert(record.id(), record);
        Ok(())
    }

    async fn replace(&self, record: R) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if !rows.contains_key(&record.id()) {
            return Err(StoreError::NotFound);
        }
        rows.insert(record.id(), record);
        Ok(())
    }

    async fn get(&self, active: Option<TenantId>, id: R::Id) -> Result<Option<R>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let visible = tenant_filter::<R>(active);
        Ok(rows.get(&id).filter(|r| visible(*r)).cloned())
    }

    async fn list(&self, active: Option<TenantId>) -> Result<Vec<R>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let visible = tenant_filter::<R>(active);
        Ok(rows.values().filter(|r| visible(*r)).cloned().collect())
    }

    async fn remove(&self, active: Option<TenantId>, id: R::Id) -> Result<bool, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let visible = tenant_filter(active);
        let matches = rows.get(&id).map(|r| visible(r)).unwrap_or(false);
        if matches {
            rows.remove(&id);
        }
        Ok(matches)
    }
}
