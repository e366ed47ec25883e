//! Built-in entities: schemas, collection extensions and typed helpers.

pub mod audit;
pub mod consumer;
pub mod entitlement;
pub mod organization;
pub mod sentiment_topic;
pub mod site;
pub mod site_enrollment;
pub mod site_enrollment_v2;

pub use audit::AuditCollection;
pub use consumer::{ConsumerCollection, ConsumerRules};
pub use sentiment_topic::{SentimentTopicCollection, SubPrompts};
pub use site::SiteCollection;

use tablekit_core::{Schema, SchemaError};

use crate::dual_write::EnrollmentShadow;
use crate::registry::{RegistryBuilder, RegistryError};

/// Schemas of every built-in entity.
pub fn schemas() -> Result<Vec<Schema>, SchemaError> {
    Ok(vec![
        organization::schema()?,
        site::schema()?,
        audit::schema()?,
        consumer::schema()?,
        entitlement::schema()?,
        site_enrollment::schema()?,
        site_enrollment_v2::schema()?,
        sentiment_topic::schema()?,
    ])
}

/// Adds every built-in entity to `builder`, with its extension where it has one.
pub fn register_all(mut builder: RegistryBuilder) -> Result<RegistryBuilder, RegistryError> {
    for schema in schemas()? {
        let entity = schema.entity_name().to_string();
        builder = match entity.as_str() {
            consumer::ENTITY => builder.register(schema, ConsumerRules),
            site_enrollment_v2::ENTITY => builder.register(schema, EnrollmentShadow),
            _ => builder.register_plain(schema),
        };
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::registry::Registry;
    use crate::storage::InMemoryStore;
    use tablekit_core::dto::{from_store_item, to_store_item};
    use tablekit_core::validate::{prepare, Mode};
    use tablekit_core::{record_from_json, string_set, Value};
    use serde_json::json;

    #[test]
    fn test_store_item_round_trip_for_every_entity() {
        let site_id = "6f1c1c8e-0f2f-4a7b-9a43-6c2b1a8d5e11";
        let org_id = "0b5f2bb1-2a77-4c4d-8a34-1b0e4bb4b7c2";
        let entitlement_id = "9d5e2a9b-5a57-4f8e-8c45-3f1e0a6b7c88";
        let cases = [
            (organization::schema().unwrap(), json!({"name": "Acme", "config": {"slack": {"channel": "x"}}})),
            (
                site::schema().unwrap(),
                json!({"baseURL": "https://a.example.com", "organizationId": org_id}),
            ),
            (
                audit::schema().unwrap(),
                json!({
                    "siteId": site_id,
                    "auditType": "cwv",
                    "auditedAt": "2025-01-01T00:00:00.000Z",
                    "auditResult": {"scores": [1, 2.5]},
                }),
            ),
            (
                entitlement::schema().unwrap(),
                json!({"organizationId": org_id, "productCode": "ASO", "tier": "PAID"}),
            ),
            (
                site_enrollment_v2::schema().unwrap(),
                json!({"siteId": site_id, "entitlementId": entitlement_id}),
            ),
            (
                sentiment_topic::schema().unwrap(),
                json!({"siteId": site_id, "topicId": "t", "name": "T", "subPrompts": ["a"]}),
            ),
        ];

        for (schema, input) in cases {
            let record = prepare(&schema, record_from_json(input), Mode::Create).unwrap();
            let item = to_store_item(&schema, &record).unwrap();
            assert_eq!(from_store_item(&schema, &item).unwrap(), record);
        }
    }

    #[test]
    fn test_string_sets_survive_the_round_trip() {
        let schema = consumer::schema().unwrap();
        let mut input = record_from_json(json!({
            "clientId": "c",
            "consumerName": "n",
            "imsOrgId": "o@AdobeOrg",
        }));
        input.insert("capabilities".to_string(), string_set(["site:read"]));
        let record = prepare(&schema, input, Mode::Create).unwrap();

        let item = to_store_item(&schema, &record).unwrap();

        assert!(matches!(item.get("capabilities"), Some(Value::StringSet(_))));
        assert_eq!(from_store_item(&schema, &item).unwrap(), record);
    }

    #[test]
    fn test_every_schema_builds_and_fits_the_table() {
        let schemas = schemas().unwrap();
        let registry = register_all(Registry::builder(Arc::new(InMemoryStore::new())))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.schemas().count(), schemas.len());
        assert_eq!(
            registry.gsi_count(),
            schemas.iter().map(Schema::gsi_count).max().unwrap()
        );
        // Consumer: byClientId, byImsOrgId and all.
        assert_eq!(registry.schema("Consumer").unwrap().gsi_count(), 3);
    }
}
