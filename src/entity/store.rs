/// In-memory entity stores
use super::{
    aggregate::{self, Snapshot},
    transition::{self, TransitionInput, TransitionOutcome},
    FilterState, Record,
};
use crate::error::{HubError, HubResult};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Ordered collection of one entity type
#[derive(Debug, Clone)]
pub struct EntityStore<R> {
    records: Vec<R>,
}

impl<R> Default for EntityStore<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Record> EntityStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<R>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn require(&self, id: &str) -> HubResult<&R> {
        self.get(id)
            .ok_or_else(|| HubError::NotFound(format!("{} {} not found", R::ENTITY, id)))
    }

    /// Add a record at the top of the list
    pub fn insert(&mut self, record: R) -> HubResult<&R> {
        if self.get(record.id()).is_some() {
            return Err(HubError::Conflict(format!(
                "{} {} already exists",
                R::ENTITY,
                record.id()
            )));
        }
        self.records.insert(0, record);
        Ok(&self.records[0])
    }

    /// Remove a record, returning it
    pub fn remove(&mut self, id: &str) -> HubResult<R> {
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| HubError::NotFound(format!("{} {} not found", R::ENTITY, id)))?;
        Ok(self.records.remove(index))
    }

    pub fn list(&self, filter: &FilterState) -> Vec<&R> {
        filter.apply(&self.records)
    }

    /// Aggregates over the whole store, independent of any list filter
    pub fn snapshot(&self) -> Snapshot<R::Summary> {
        aggregate::snapshot(&self.records)
    }

    /// Apply a named action to one record in place
    pub fn transition(
        &mut self,
        id: &str,
        action: &str,
        input: &TransitionInput,
    ) -> HubResult<TransitionOutcome<R>> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| HubError::NotFound(format!("{} {} not found", R::ENTITY, id)))?;
        transition::apply(record, action, input)
    }

    /// Ids of records matching `pred`, in store order
    pub fn ids_where(&self, pred: impl Fn(&R) -> bool) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| pred(*r))
            .map(|r| r.id().to_string())
            .collect()
    }
}

/// One store per tenant for a single entity type
///
/// Tenants never share records. A tenant's store is created on first use,
/// seeded with mock data when seeding is enabled.
pub struct TenantStores<R> {
    stores: RwLock<HashMap<String, EntityStore<R>>>,
    seed_mock_data: bool,
}

impl<R: Record> TenantStores<R> {
    pub fn new(seed_mock_data: bool) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            seed_mock_data,
        }
    }

    fn fresh_store(&self) -> EntityStore<R> {
        if self.seed_mock_data {
            EntityStore::with_records(R::mock_data(Utc::now()))
        } else {
            EntityStore::new()
        }
    }

    /// Run `f` against the tenant's store under a read lock
    pub async fn read<T>(&self, tenant: &str, f: impl FnOnce(&EntityStore<R>) -> T) -> T {
        {
            let stores = self.stores.read().await;
            if let Some(store) = stores.get(tenant) {
                return f(store);
            }
        }

        let mut stores = self.stores.write().await;
        let store = stores
            .entry(tenant.to_string())
            .or_insert_with(|| self.fresh_store());
        f(store)
    }

    /// Run `f` against the tenant's store under the write lock
    pub async fn write<T>(&self, tenant: &str, f: impl FnOnce(&mut EntityStore<R>) -> T) -> T {
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(tenant.to_string())
            .or_insert_with(|| self.fresh_store());
        f(store)
    }

    /// Visit every tenant's store that has been created so far
    pub async fn for_each_tenant(&self, mut f: impl FnMut(&str, &mut EntityStore<R>)) {
        let mut stores = self.stores.write().await;
        for (tenant, store) in stores.iter_mut() {
            f(tenant, store);
        }
    }

    /// Total records across tenants
    pub async fn total_records(&self) -> usize {
        self.stores.read().await.values().map(EntityStore::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::subscriptions::{Subscription, SubscriptionStatus};
    use crate::entity::StatusTag;

    fn subscription(id: &str, status: SubscriptionStatus) -> Subscription {
        let mut sub = Subscription::mock_data(Utc::now()).remove(0);
        sub.id = id.to_string();
        sub.status = status;
        sub
    }

    #[test]
    fn test_pause_then_resume_moves_record_between_filters() {
        let mut store = EntityStore::with_records(vec![
            subscription("sub_a", SubscriptionStatus::Active),
            subscription("sub_b", SubscriptionStatus::Active),
            subscription("sub_c", SubscriptionStatus::Paused),
        ]);
        let paused = FilterState::new().status(SubscriptionStatus::Paused);

        let found: Vec<&str> = store.list(&paused).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(found, vec!["sub_c"]);

        let input = TransitionInput::new("admin@tenant", None, Utc::now());
        let outcome = store.transition("sub_c", "resume", &input).unwrap();
        assert_eq!(outcome.to.as_str(), "active");

        assert!(store.list(&paused).is_empty());
        assert_eq!(store.snapshot().count("active"), 3);
    }

    #[test]
    fn test_insert_rejects_duplicate_ids() {
        let mut store = EntityStore::new();
        store
            .insert(subscription("sub_a", SubscriptionStatus::Active))
            .unwrap();
        let err = store
            .insert(subscription("sub_a", SubscriptionStatus::Paused))
            .unwrap_err();
        assert!(matches!(err, HubError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_places_new_records_first() {
        let mut store = EntityStore::with_records(vec![subscription(
            "sub_a",
            SubscriptionStatus::Active,
        )]);
        store
            .insert(subscription("sub_new", SubscriptionStatus::Active))
            .unwrap();
        assert_eq!(store.records()[0].id, "sub_new");
    }

    #[test]
    fn test_remove_and_missing_records() {
        let mut store = EntityStore::with_records(vec![subscription(
            "sub_a",
            SubscriptionStatus::Active,
        )]);
        assert_eq!(store.remove("sub_a").unwrap().id, "sub_a");
        assert!(store.is_empty());
        assert!(matches!(store.remove("sub_a"), Err(HubError::NotFound(_))));

        let input = TransitionInput::new("admin", None, Utc::now());
        assert!(matches!(
            store.transition("sub_a", "pause", &input),
            Err(HubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let stores: TenantStores<Subscription> = TenantStores::new(true);
        let seeded = stores.read("acme", |s| s.len()).await;
        assert!(seeded > 0);

        stores
            .write("acme", |s| s.remove("sub_001").map(|_| ()))
            .await
            .unwrap();

        assert_eq!(stores.read("acme", |s| s.len()).await, seeded - 1);
        assert_eq!(stores.read("globex", |s| s.len()).await, seeded);
        assert_eq!(stores.total_records().await, seeded * 2 - 1);
    }

    #[tokio::test]
    async fn test_unseeded_tenants_start_empty() {
        let stores: TenantStores<Subscription> = TenantStores::new(false);
        assert!(stores.read("acme", |s| s.is_empty()).await);
    }
}
