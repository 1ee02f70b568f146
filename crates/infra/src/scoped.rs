//! Tenant-scoped repository: the access filter and stamping rules composed
//! into every read and write.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use spendtrack_core::TenantId;
use spendtrack_tenancy::{TenantContext, TenantScoped};

use crate::error::StoreError;
use crate::record_store::RecordStore;

/// The single tenant predicate.
///
/// Every query path over tenant-scoped records is conjoined with this filter.
/// An unset context matches **nothing** — absent tenant context is never
/// "match all tenants".
pub fn tenant_filter<R>(active: Option<TenantId>) -> impl Fn(&R) -> bool
where
    R: TenantScoped,
{
    move |record| match active {
        Some(tenant) => record.tenant_id() == tenant,
        None => false,
    }
}

/// The only read/write surface for tenant-scoped records.
///
/// Construction consumes the raw store handle, so application wiring that
/// builds its stores straight into repositories leaves no unguarded
/// insert/update path.
///
/// Reads are narrowed to the active tenant; a lookup of another tenant's
/// record is indistinguishable from "not found". Writes stamp
/// system-controlled fields (owning tenant, timestamps) and override whatever
/// the caller supplied.
pub struct ScopedRepository<R>
where
    R: TenantScoped,
{
    store: Arc<dyn RecordStore<R>>,
}

impl<R> ScopedRepository<R>
where
    R: TenantScoped + Clone,
{
    pub fn new(store: Arc<dyn RecordStore<R>>) -> Self {
        Self { store }
    }

    /// Create a record under the active tenant.
    ///
    /// Requires a bound context; the record's tenant id is overwritten with
    /// the context value regardless of what the caller set, and the creation
    /// timestamp is stamped.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        mut record: R,
        now: DateTime<Utc>,
    ) -> Result<R, StoreError> {
        let tenant = ctx.current().ok_or(StoreError::MissingTenantContext)?;

        record.assign_tenant(tenant);
        record.stamp_created(now);

        self.store.insert(record.clone()).await?;
        Ok(record)
    }

    /// Update an existing record under the active tenant.
    ///
    /// The target must be visible through the filter (a foreign row is
    /// "not found"). The owning tenant and creation stamp are re-forced from
    /// the stored row — an update never mutates either — and the update
    /// timestamp is refreshed.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        mut record: R,
        now: DateTime<Utc>,
    ) -> Result<R, StoreError> {
        let tenant = ctx.current().ok_or(StoreError::MissingTenantContext)?;

        let existing = self
            .store
            .get(Some(tenant), record.id())
            .await?
            .ok_or(StoreError::NotFound)?;

        record.assign_tenant(tenant);
        record.stamp_created(existing.created_at());
        record.stamp_updated(now);

        self.store.replace(record.clone()).await?;
        Ok(record)
    }

    /// Fetch one record visible to the active tenant.
    pub async fn get(&self, ctx: &TenantContext, id: R::Id) -> Result<Option<R>, StoreError> {
        self.store.get(ctx.current(), id).await
    }

    /// List records visible to the active tenant.
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<R>, StoreError> {
        self.store.list(ctx.current()).await
    }

    /// Delete one record visible to the active tenant; returns whether a row
    /// was deleted. A foreign or missing row is `false` either way.
    pub async fn delete(&self, ctx: &TenantContext, id: R::Id) -> Result<bool, StoreError> {
        self.store.remove(ctx.current(), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::InMemoryRecordStore;
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Minimal tenant-scoped record for exercising the repository.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Doc {
        id: Uuid,
        tenant_id: TenantId,
        body: String,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    }

    impl Doc {
        fn new(tenant_id: TenantId, body: &str) -> Self {
            Self {
                id: Uuid::now_v7(),
                tenant_id,
                body: body.to_string(),
                created_at: Utc::now(),
                updated_at: None,
            }
        }
    }

    impl TenantScoped for Doc {
        type Id = Uuid;

        fn id(&self) -> Uuid {
            self.id
        }

        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }

        fn assign_tenant(&mut self, tenant_id: TenantId) {
            self.tenant_id = tenant_id;
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn stamp_created(&mut self, at: DateTime<Utc>) {
            self.created_at = at;
            self.updated_at = None;
        }

        fn stamp_updated(&mut self, at: DateTime<Utc>) {
            self.updated_at = Some(at);
        }
    }

    fn repository() -> ScopedRepository<Doc> {
        ScopedRepository::new(Arc::new(InMemoryRecordStore::<Doc>::new()))
    }

    #[tokio::test]
    async fn create_overwrites_caller_supplied_tenant() {
        let repo = repository();
        let tenant = TenantId::new();
        let ctx = TenantContext::bound(tenant);

        // The caller claims a different tenant; stamping must win.
        let attacker_tenant = TenantId::new();
        let stored = repo
            .create(&ctx, Doc::new(attacker_tenant, "hello"), Utc::now())
            .await
            .unwrap();

        assert_eq!(stored.tenant_id, tenant);
    }

    #[tokio::test]
    async fn create_without_context_is_rejected() {
        let repo = repository();
        let ctx = TenantContext::new();

        let result = repo
            .create(&ctx, Doc::new(TenantId::new(), "hello"), Utc::now())
            .await;

        assert_eq!(result.unwrap_err(), StoreError::MissingTenantContext);
    }

    #[tokio::test]
    async fn create_stamps_creation_time() {
        let repo = repository();
        let ctx = TenantContext::bound(TenantId::new());
        let now = Utc::now();

        let mut doc = Doc::new(TenantId::new(), "hello");
        doc.created_at = now - chrono::Duration::days(30);
        doc.updated_at = Some(now - chrono::Duration::days(30));

        let stored = repo.create(&ctx, doc, now).await.unwrap();
        assert_eq!(stored.created_at, now);
        assert!(stored.updated_at.is_none());
    }

    #[tokio::test]
    async fn reads_are_disjoint_across_tenants() {
        let repo = repository();

        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let ctx1 = TenantContext::bound(t1);
        let ctx2 = TenantContext::bound(t2);

        repo.create(&ctx1, Doc::new(t1, "one"), Utc::now())
            .await
            .unwrap();
        let foreign = repo
            .create(&ctx2, Doc::new(t2, "two"), Utc::now())
            .await
            .unwrap();

        let visible = repo.list(&ctx1).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert!(visible.iter().all(|d| d.tenant_id == t1));

        // Lookup of the other tenant's row is indistinguishable from missing.
        assert_eq!(repo.get(&ctx1, foreign.id).await.unwrap(), None);
        assert_eq!(repo.get(&ctx1, Uuid::now_v7()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unset_context_matches_nothing() {
        let repo = repository();
        let tenant = TenantId::new();
        let bound = TenantContext::bound(tenant);

        let stored = repo
            .create(&bound, Doc::new(tenant, "hello"), Utc::now())
            .await
            .unwrap();

        let unset = TenantContext::new();
        assert!(repo.list(&unset).await.unwrap().is_empty());
        assert_eq!(repo.get(&unset, stored.id).await.unwrap(), None);
        assert!(!repo.delete(&unset, stored.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_refreshes_stamp_and_preserves_tenant_and_created_at() {
        let repo = repository();
        let tenant = TenantId::new();
        let ctx = TenantContext::bound(tenant);
        let created = Utc::now();

        let stored = repo
            .create(&ctx, Doc::new(tenant, "v1"), created)
            .await
            .unwrap();

        // Tamper with everything the caller should not control.
        let mut edited = stored.clone();
        edited.body = "v2".to_string();
        edited.tenant_id = TenantId::new();
        edited.created_at = created - chrono::Duration::days(7);

        let later = created + chrono::Duration::minutes(5);
        let updated = repo.update(&ctx, edited, later).await.unwrap();

        assert_eq!(updated.body, "v2");
        assert_eq!(updated.tenant_id, tenant);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, Some(later));
    }

    #[tokio::test]
    async fn update_of_foreign_record_is_not_found() {
        let repo = repository();
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let ctx1 = TenantContext::bound(t1);
        let ctx2 = TenantContext::bound(t2);

        let foreign = repo
            .create(&ctx2, Doc::new(t2, "other"), Utc::now())
            .await
            .unwrap();

        let result = repo.update(&ctx1, foreign, Utc::now()).await;
        assert_eq!(result.unwrap_err(), StoreError::NotFound);
    }

    #[tokio::test]
    async fn delete_cannot_cross_tenants() {
        let repo = repository();
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let ctx1 = TenantContext::bound(t1);
        let ctx2 = TenantContext::bound(t2);

        let foreign = repo
            .create(&ctx2, Doc::new(t2, "other"), Utc::now())
            .await
            .unwrap();

        assert!(!repo.delete(&ctx1, foreign.id).await.unwrap());
        // Still visible to its owner.
        assert!(repo.get(&ctx2, foreign.id).await.unwrap().is_some());
    }

    proptest! {
        /// Records stamped under one tenant are never visible through a
        /// repository scoped to any other tenant.
        #[test]
        fn isolation_holds_for_arbitrary_tenant_pairs(a in any::<u128>(), b in any::<u128>()) {
            prop_assume!(a != b);

            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let t1 = TenantId::from_uuid(Uuid::from_u128(a));
                let t2 = TenantId::from_uuid(Uuid::from_u128(b));
                let ctx1 = TenantContext::bound(t1);
                let ctx2 = TenantContext::bound(t2);
                let repo = repository();

                let foreign = repo
                    .create(&ctx2, Doc::new(t2, "secret"), Utc::now())
                    .await
                    .unwrap();

                prop_assert!(repo.list(&ctx1).await.unwrap().is_empty());
                prop_assert_eq!(repo.get(&ctx1, foreign.id).await.unwrap(), None);
                Ok(())
            })?;
        }
    }
}
