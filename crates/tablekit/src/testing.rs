//! Test fixtures shared by the module tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use tablekit_core::schema::naming::decapitalize;
use tablekit_core::schema::ENTITY_TYPE_FIELD;
use tablekit_core::storage::{
    BatchGetOutcome, BatchWriteOutcome, Item, PrimaryKey, PutMode, QueryPage, QueryRequest, Result,
    Store, StoreError,
};
use tablekit_core::{record_from_json, Record, Value};

use crate::config::Config;
use crate::registry::{build_registry, Registry};
use crate::storage::InMemoryStore;

pub(crate) const IMS_ORG_ID: &str = "1234567890ABCDEF@AdobeOrg";

/// Built-in registry over a fresh in-memory store, with [`IMS_ORG_ID`] allow-listed.
pub(crate) fn registry() -> Registry {
    registry_on(Arc::new(InMemoryStore::new()))
}

pub(crate) fn registry_on(store: Arc<dyn Store>) -> Registry {
    let config = Config {
        s2s_allowed_ims_org_ids: vec![IMS_ORG_ID.to_string()],
        ..Config::default()
    };
    build_registry(store, &config).unwrap()
}

pub(crate) fn sample_organization() -> Record {
    record_from_json(json!({"name": "Acme", "imsOrgId": IMS_ORG_ID}))
}

/// Creates an organization and one site at `https://www.example.com`; returns `(site_id, organization_id)`.
pub(crate) async fn sample_site(registry: &Registry) -> (String, String) {
    let organization = registry
        .collection("Organization")
        .unwrap()
        .create(sample_organization())
        .await
        .unwrap();
    let organization_id = organization.id().unwrap().to_string();
    let site = registry
        .collection("Site")
        .unwrap()
        .create(record_from_json(json!({
            "baseURL": "https://www.example.com",
            "organizationId": organization_id,
        })))
        .await
        .unwrap();
    (site.id().unwrap().to_string(), organization_id)
}

/// Store that fails every write and query touching one entity and passes the rest through.
pub(crate) struct FailingStore {
    inner: InMemoryStore,
    entity: String,
    partition_prefix: String,
}

impl FailingStore {
    pub(crate) fn new(inner: InMemoryStore, entity: &str) -> Self {
        Self {
            inner,
            entity: entity.to_string(),
            partition_prefix: format!("${}#", decapitalize(entity)),
        }
    }

    fn is_target(&self, item: &Item) -> bool {
        item.get(ENTITY_TYPE_FIELD).and_then(Value::as_str) == Some(self.entity.as_str())
    }

    fn failure(&self) -> StoreError {
        StoreError::ConnectionFailed(format!("injected failure for {}", self.entity))
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        self.inner.get_item(key).await
    }

    async fn put_item(&self, item: Item, mode: PutMode) -> Result<()> {
        if self.is_target(&item) {
            return Err(self.failure());
        }
        self.inner.put_item(item, mode).await
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<()> {
        self.inner.delete_item(key).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        if request.pk_value.starts_with(&self.partition_prefix) {
            return Err(self.failure());
        }
        self.inner.query(request).await
    }

    async fn batch_write(&self, puts: Vec<Item>, deletes: Vec<PrimaryKey>) -> Result<BatchWriteOutcome> {
        if puts.iter().any(|item| self.is_target(item)) {
            return Err(self.failure());
        }
        self.inner.batch_write(puts, deletes).await
    }

    async fn batch_get(&self, keys: &[PrimaryKey]) -> Result<BatchGetOutcome> {
        self.inner.batch_get(keys).await
    }
}
