//! Service-to-service API consumers.
//!
//! Creation is guarded in a fixed order: the owning IMS organization must be allow-listed in the
//! registry configuration, every capability must name a registered entity and a known operation,
//! and the client id must be unused.

use std::ops::Deref;

use async_trait::async_trait;

use tablekit_core::attribute::{is_iso_date, is_non_empty_string};
use tablekit_core::capability::{invalid_capabilities_message, validate_capabilities};
use tablekit_core::{
    AttributeSpec, DataError, Record, Schema, SchemaBuilder, SchemaError, Value,
};

use crate::collection::{Collection, CollectionExtension, QueryOptions, QueryOutput};
use crate::model::Model;
use crate::registry::{Registry, RegistryError};

pub const ENTITY: &str = "Consumer";

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_SUSPEND: &str = "SUSPEND";

pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .add_attribute(
            "clientId",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute("technicalAccountId", AttributeSpec::string())
        .add_attribute(
            "consumerName",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute(
            "imsOrgId",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute("capabilities", AttributeSpec::string_set().required())
        .add_attribute(
            "status",
            AttributeSpec::one_of([STATUS_ACTIVE, STATUS_SUSPEND])
                .required()
                .default_value(STATUS_ACTIVE),
        )
        .add_attribute("revokedAt", AttributeSpec::string().validate(is_iso_date))
        .add_index(&["clientId"], &["updatedAt"])
        .add_index(&["imsOrgId"], &["updatedAt"])
        .add_all_index(&["consumerName"])
        .build()
}

/// String members of a list or set attribute; anything else yields nothing.
fn string_members(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::StringSet(set)) => set.iter().cloned().collect(),
        Some(Value::List(items)) => items.iter().map(|item| item.to_string()).collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// Creation guards for consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumerRules;

impl ConsumerRules {
    fn check_ims_org(collection: &Collection, item: &Record) -> tablekit_core::Result<()> {
        let allowed = collection.registry().config().s2s_allowed_ims_org_ids;
        if allowed.is_empty() {
            return Err(DataError::rejected(
                ENTITY,
                "S2S_ALLOWED_IMS_ORG_IDS is not configured. Cannot create a consumer without an allowlist.",
            ));
        }

        let ims_org_id = item.get("imsOrgId").and_then(Value::as_str).unwrap_or_default();
        if !allowed.iter().any(|id| id == ims_org_id) {
            return Err(DataError::rejected(
                ENTITY,
                format!("The imsOrgId \"{ims_org_id}\" is not in the list of allowed IMS Org IDs"),
            ));
        }
        Ok(())
    }

    fn check_capabilities(collection: &Collection, item: &Record) -> tablekit_core::Result<()> {
        let capabilities = string_members(item.get("capabilities"));
        if capabilities.is_empty() {
            return Ok(());
        }

        let entity_names = collection.registry().entity_names();
        validate_capabilities(&capabilities, &entity_names)
            .map_err(|invalid| DataError::rejected(ENTITY, invalid_capabilities_message(&invalid)))
    }

    async fn check_client_id(collection: &Collection, item: &Record) -> tablekit_core::Result<()> {
        let client_id = item
            .get("clientId")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                DataError::rejected(ENTITY, "clientId is required to create a consumer")
            })?;

        if find_by_client_id(collection, client_id).await?.is_some() {
            return Err(DataError::rejected(
                ENTITY,
                format!("A consumer with clientId \"{client_id}\" already exists"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionExtension for ConsumerRules {
    async fn before_create(&self, collection: &Collection, item: &Record) -> tablekit_core::Result<()> {
        Self::check_ims_org(collection, item)?;
        Self::check_capabilities(collection, item)?;
        Self::check_client_id(collection, item).await
    }
}

async fn find_by_client_id(collection: &Collection, client_id: &str) -> tablekit_core::Result<Option<Model>> {
    let keys = Record::from([("clientId".to_string(), Value::from(client_id))]);
    collection.find_by_index_keys(&keys, QueryOptions::new()).await
}

/// Consumer collection with client id and organization lookups.
#[derive(Debug, Clone)]
pub struct ConsumerCollection(Collection);

impl ConsumerCollection {
    pub fn from_registry(registry: &Registry) -> Result<Self, RegistryError> {
        registry.collection(ENTITY).map(Self)
    }

    pub async fn find_by_client_id(&self, client_id: &str) -> tablekit_core::Result<Option<Model>> {
        find_by_client_id(&self.0, client_id).await
    }

    pub async fn all_by_ims_org_id(
        &self,
        ims_org_id: &str,
        options: QueryOptions,
    ) -> tablekit_core::Result<QueryOutput> {
        let keys = Record::from([("imsOrgId".to_string(), Value::from(ims_org_id))]);
        self.0.all_by_index_keys(&keys, options).await
    }
}

impl Deref for ConsumerCollection {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry, IMS_ORG_ID};
    use serde_json::json;
    use tablekit_core::record_from_json;

    fn consumer(client_id: &str, ims_org_id: &str, capabilities: &[&str]) -> Record {
        record_from_json(json!({
            "clientId": client_id,
            "consumerName": "Reporting",
            "imsOrgId": ims_org_id,
            "capabilities": capabilities,
        }))
    }

    fn message(err: DataError) -> String {
        match err {
            DataError::Validation { message, .. } => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_client_id() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();

        let created = consumers
            .create(consumer("client-1", IMS_ORG_ID, &["site:read", "organization:write"]))
            .await
            .unwrap();

        assert_eq!(created.get_str("status"), Some(STATUS_ACTIVE));
        let found = consumers.find_by_client_id("client-1").await.unwrap().unwrap();
        assert_eq!(found.id(), created.id());
        assert_eq!(found.get_string_set("capabilities").unwrap().len(), 2);
        assert_eq!(
            consumers
                .all_by_ims_org_id(IMS_ORG_ID, QueryOptions::new())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_org_outside_allow_list_is_rejected_before_any_write() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();

        let err = consumers
            .create(consumer("client-1", "other@AdobeOrg", &["site:read"]))
            .await
            .unwrap_err();

        assert_eq!(
            message(err),
            "The imsOrgId \"other@AdobeOrg\" is not in the list of allowed IMS Org IDs"
        );
        assert!(consumers.find_by_client_id("client-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_allow_list_is_rejected() {
        let registry = registry();
        registry.update_config(|config| config.s2s_allowed_ims_org_ids.clear());
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();

        let err = consumers
            .create(consumer("client-1", IMS_ORG_ID, &["site:read"]))
            .await
            .unwrap_err();

        assert!(message(err).starts_with("S2S_ALLOWED_IMS_ORG_IDS is not configured"));
    }

    #[tokio::test]
    async fn test_every_invalid_capability_is_reported() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();

        let err = consumers
            .create(consumer(
                "client-1",
                IMS_ORG_ID,
                &["site:read", "admin", "site:execute", "widget:read"],
            ))
            .await
            .unwrap_err();

        assert_eq!(
            message(err),
            "Invalid capabilities: [admin, site:execute, widget:read]"
        );
        assert!(consumers.all(QueryOptions::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_allow_list_is_checked_before_capabilities() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();

        let err = consumers
            .create(consumer("client-1", "other@AdobeOrg", &["admin"]))
            .await
            .unwrap_err();

        assert!(message(err).starts_with("The imsOrgId"));
    }

    #[tokio::test]
    async fn test_duplicate_client_id_is_rejected() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();
        consumers
            .create(consumer("client-1", IMS_ORG_ID, &["site:read"]))
            .await
            .unwrap();

        let err = consumers
            .create(consumer("client-1", IMS_ORG_ID, &["audit:read"]))
            .await
            .unwrap_err();

        assert_eq!(
            message(err),
            "A consumer with clientId \"client-1\" already exists"
        );
    }

    #[tokio::test]
    async fn test_client_id_is_required() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();
        let mut item = consumer("client-1", IMS_ORG_ID, &["site:read"]);
        item.insert("clientId".to_string(), Value::from("  "));

        let err = consumers.create(item).await.unwrap_err();

        assert_eq!(message(err), "clientId is required to create a consumer");
    }

    #[tokio::test]
    async fn test_capabilities_of_every_registered_entity_are_accepted() {
        let registry = registry();
        let consumers = ConsumerCollection::from_registry(&registry).unwrap();

        let result = consumers
            .create(consumer(
                "client-2",
                IMS_ORG_ID,
                &["siteEnrollment:delete", "sentimentTopic:read", "consumer:write"],
            ))
            .await;

        assert!(result.is_ok());
    }
}
