//! Record <-> store item mapping.
//!
//! Both directions are pure. A store item is the record plus the physical key fields of every index
//! the record participates in and the `entityType` marker.

use crate::attribute::AttributeType;
use crate::error::{DataError, Result};
use crate::keys;
use crate::schema::{Schema, ENTITY_TYPE_FIELD};
use crate::storage::{Item, StoreError};
use crate::value::{Record, Value};

pub fn to_store_item(schema: &Schema, record: &Record) -> Result<Item> {
    let mut item: Item = record
        .iter()
        .filter(|(name, value)| schema.has_attribute(name) && !value.is_null())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    for (field, value) in keys::index_fields(schema, record)? {
        item.insert(field, Value::String(value));
    }
    item.insert(
        ENTITY_TYPE_FIELD.to_string(),
        Value::String(schema.entity_name().to_string()),
    );

    Ok(item)
}

pub fn from_store_item(schema: &Schema, item: &Item) -> Result<Record> {
    match item.get(ENTITY_TYPE_FIELD).and_then(Value::as_str) {
        Some(entity) if entity == schema.entity_name() => {}
        other => {
            return Err(DataError::data_access(
                schema.entity_name(),
                "hydrate",
                StoreError::InvalidData(format!(
                    "item entity type {:?} does not match {}",
                    other,
                    schema.entity_name()
                )),
            ));
        }
    }

    let mut record: Record = item
        .iter()
        .filter(|(name, _)| schema.has_attribute(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    // Stores that cannot hold empty sets drop them on write.
    for (name, spec) in schema.attributes() {
        if spec.required
            && spec.attribute_type == AttributeType::StringSet
            && !record.contains_key(name)
        {
            record.insert(name.to_string(), Value::StringSet(Default::default()));
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;
    use crate::schema::{ReferenceKind, SchemaBuilder};
    use crate::validate::{prepare, Mode};
    use crate::value::{record_from_json, string_set};
    use serde_json::json;

    fn schema() -> Schema {
        SchemaBuilder::new("Consumer")
            .add_attribute("clientId", AttributeSpec::string().required())
            .add_attribute("capabilities", AttributeSpec::string_set())
            .add_attribute("config", AttributeSpec::map())
            .add_reference(ReferenceKind::BelongsTo, "Organization")
            .build()
            .unwrap()
    }

    fn record() -> Record {
        let mut input = record_from_json(json!({
            "clientId": "client-1",
            "organizationId": "757ceb98-05c8-4e07-bb23-bc722115b2b0",
            "config": {"nested": [1.5, "x"]},
        }));
        input.insert("capabilities".to_string(), string_set(["site:read"]));
        prepare(&schema(), input, Mode::Create).unwrap()
    }

    #[test]
    fn test_to_store_item_adds_keys_and_entity_type() {
        let item = to_store_item(&schema(), &record()).unwrap();
        assert_eq!(item.get("entityType"), Some(&Value::from("Consumer")));
        assert!(item.get("pk").and_then(Value::as_str).unwrap().starts_with("$consumer#consumerId_"));
        assert_eq!(item.get("sk"), Some(&Value::from("$consumer")));
        assert!(item.contains_key("gsi1pk"));
        assert!(item.contains_key("gsi1sk"));
    }

    #[test]
    fn test_round_trip() {
        let schema = schema();
        let record = record();
        let item = to_store_item(&schema, &record).unwrap();
        assert_eq!(from_store_item(&schema, &item).unwrap(), record);
    }

    #[test]
    fn test_required_empty_set_survives_a_store_that_drops_it() {
        let schema = SchemaBuilder::new("Consumer")
            .add_attribute("clientId", AttributeSpec::string().required())
            .add_attribute("capabilities", AttributeSpec::string_set().required())
            .build()
            .unwrap();
        let mut input = record_from_json(json!({"clientId": "client-1"}));
        input.insert("capabilities".to_string(), string_set(Vec::<String>::new()));
        let record = prepare(&schema, input, Mode::Create).unwrap();

        let mut item = to_store_item(&schema, &record).unwrap();
        item.remove("capabilities");
        let restored = from_store_item(&schema, &item).unwrap();

        assert_eq!(restored, record);
        assert!(prepare(&schema, restored.clone(), Mode::Update { stored: &restored }).is_ok());
    }

    #[test]
    fn test_optional_empty_set_is_treated_as_absent() {
        let mut input = record_from_json(json!({
            "clientId": "client-1",
            "organizationId": "757ceb98-05c8-4e07-bb23-bc722115b2b0",
        }));
        input.insert("capabilities".to_string(), string_set(Vec::<String>::new()));

        let record = prepare(&schema(), input, Mode::Create).unwrap();

        assert!(!record.contains_key("capabilities"));
        let item = to_store_item(&schema(), &record).unwrap();
        assert_eq!(from_store_item(&schema(), &item).unwrap(), record);
    }

    #[test]
    fn test_from_store_item_rejects_foreign_entity() {
        let schema = schema();
        let mut item = to_store_item(&schema, &record()).unwrap();
        item.insert("entityType".to_string(), Value::from("Site"));
        assert!(matches!(
            from_store_item(&schema, &item),
            Err(DataError::DataAccess { .. })
        ));
    }

    #[test]
    fn test_to_store_item_requires_primary_key() {
        let result = to_store_item(&schema(), &Record::new());
        assert!(matches!(result, Err(DataError::MissingKeyAttribute { .. })));
    }
}
