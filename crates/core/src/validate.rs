//! Attribute validation.
//!
//! Pure functions over a schema and a candidate record. Defaults are applied on create, required
//! attributes are enforced, values are type checked and passed through their custom predicate, and
//! read-only attributes are compared with the stored record on update.

use crate::error::{DataError, Result};
use crate::schema::Schema;
use crate::value::{Record, Value};

/// Validation mode.
#[derive(Debug, Clone, Copy)]
pub enum Mode<'a> {
    Create,
    /// Update against the last persisted state.
    Update { stored: &'a Record },
}

/// Validates `input` and returns the normalized record.
pub fn prepare(schema: &Schema, input: Record, mode: Mode<'_>) -> Result<Record> {
    let entity = schema.entity_name();

    if let Some(unknown) = input.keys().find(|name| !schema.has_attribute(name)) {
        return Err(DataError::rejected(
            entity,
            format!("unknown attribute {unknown}"),
        ));
    }

    let mut record: Record = input
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    for (name, spec) in schema.attributes() {
        if !record.contains_key(name) {
            if let (Mode::Create, Some(default)) = (mode, &spec.default) {
                record.insert(name.to_string(), default.produce());
            }
        }

        match record.remove(name) {
            None if spec.required => {
                return Err(DataError::MissingAttribute {
                    entity: entity.to_string(),
                    attribute: name.to_string(),
                });
            }
            None => {}
            Some(value) => {
                let value = check_value(schema, name, value)?;
                if spec.required || !is_empty_set(&value) {
                    record.insert(name.to_string(), value);
                }
            }
        }

        if let Mode::Update { stored } = mode {
            if spec.read_only && stored.get(name) != record.get(name) {
                return Err(DataError::ReadOnlyViolation {
                    entity: entity.to_string(),
                    attribute: name.to_string(),
                });
            }
        }
    }

    Ok(record)
}

/// Validates a single attribute assignment. `Null` clears an optional attribute.
pub fn validate_attribute(schema: &Schema, name: &str, value: Value) -> Result<Value> {
    let entity = schema.entity_name();
    let Some(spec) = schema.attribute(name) else {
        return Err(DataError::rejected(entity, format!("unknown attribute {name}")));
    };

    if value.is_null() {
        if spec.required {
            return Err(DataError::MissingAttribute {
                entity: entity.to_string(),
                attribute: name.to_string(),
            });
        }
        return Ok(Value::Null);
    }

    let value = check_value(schema, name, value)?;
    if !spec.required && is_empty_set(&value) {
        return Ok(Value::Null);
    }
    Ok(value)
}

/// Empty string sets cannot be stored; optional ones are treated as absent.
fn is_empty_set(value: &Value) -> bool {
    matches!(value, Value::StringSet(set) if set.is_empty())
}

fn check_value(schema: &Schema, name: &str, value: Value) -> Result<Value> {
    let entity = schema.entity_name();
    let Some(spec) = schema.attribute(name) else {
        return Err(DataError::rejected(entity, format!("unknown attribute {name}")));
    };
    let value = normalize(&spec.attribute_type, value);

    if !spec.attribute_type.accepts(&value) {
        let reason = format!(
            "expected {}, got {}",
            spec.attribute_type.describe(),
            value.type_name()
        );
        return Err(DataError::invalid_attribute(entity, name, &value, &reason));
    }

    if let Some(check) = &spec.check {
        if let Err(reason) = check(&value) {
            return Err(DataError::invalid_attribute(entity, name, &value, &reason));
        }
    }

    Ok(value)
}

/// Lists of strings become sets when the attribute is declared as a set.
fn normalize(attribute_type: &crate::attribute::AttributeType, value: Value) -> Value {
    use crate::attribute::AttributeType;

    match (attribute_type, value) {
        (AttributeType::StringSet, Value::List(items))
            if items.iter().all(|item| item.as_str().is_some()) =>
        {
            Value::StringSet(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )
        }
        (_, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{is_http_url, AttributeSpec};
    use crate::schema::SchemaBuilder;
    use crate::value::{record_from_json, string_set};
    use serde_json::json;

    fn schema() -> Schema {
        SchemaBuilder::new("Site")
            .add_attribute(
                "baseURL",
                AttributeSpec::string().required().validate(is_http_url),
            )
            .add_attribute(
                "deliveryType",
                AttributeSpec::one_of(["aem_edge", "aem_cs", "other"]).default_value("aem_edge"),
            )
            .add_attribute("isLive", AttributeSpec::boolean().default_value(false))
            .add_attribute("tags", AttributeSpec::string_set())
            .add_attribute("name", AttributeSpec::string())
            .add_attribute(
                "hlxVersion",
                AttributeSpec::number().validate_with(|v| match v.as_f64() {
                    Some(n) if n >= 0.0 => Ok(()),
                    _ => Err("must be non-negative".to_string()),
                }),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_applies_defaults() {
        let input = record_from_json(json!({"baseURL": "https://example.com"}));
        let record = prepare(&schema(), input, Mode::Create).unwrap();

        assert_eq!(record.get("deliveryType"), Some(&Value::from("aem_edge")));
        assert_eq!(record.get("isLive"), Some(&Value::Bool(false)));
        assert!(record.get("siteId").and_then(Value::as_str).is_some());
        assert!(record.contains_key("createdAt"));
        assert!(record.contains_key("updatedAt"));
        assert!(!record.contains_key("name"));
    }

    #[test]
    fn test_create_missing_required_attribute() {
        let result = prepare(&schema(), Record::new(), Mode::Create);
        assert_eq!(
            result.unwrap_err(),
            DataError::MissingAttribute {
                entity: "Site".to_string(),
                attribute: "baseURL".to_string(),
            }
        );
    }

    #[test]
    fn test_null_counts_as_absent() {
        let input = record_from_json(json!({"baseURL": null}));
        assert!(matches!(
            prepare(&schema(), input, Mode::Create),
            Err(DataError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_custom_predicate_failure_names_attribute_and_value() {
        let input = record_from_json(json!({"baseURL": "not a url"}));
        let error = prepare(&schema(), input, Mode::Create).unwrap_err();
        match error {
            DataError::Validation {
                attribute, message, ..
            } => {
                assert_eq!(attribute.as_deref(), Some("baseURL"));
                assert!(message.contains("not a url"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_predicate_reason_is_reported() {
        let input = record_from_json(json!({"baseURL": "https://a.com", "hlxVersion": -1}));
        let error = prepare(&schema(), input, Mode::Create).unwrap_err();
        assert!(error.to_string().contains("must be non-negative"));
    }

    #[test]
    fn test_type_mismatch_is_validation_error() {
        let input = record_from_json(json!({"baseURL": "https://a.com", "isLive": "yes"}));
        let error = prepare(&schema(), input, Mode::Create).unwrap_err();
        assert!(error
            .to_string()
            .contains("expected boolean, got string"));
    }

    #[test]
    fn test_enum_rejects_unknown_member() {
        let input = record_from_json(json!({"baseURL": "https://a.com", "deliveryType": "cms"}));
        assert!(matches!(
            prepare(&schema(), input, Mode::Create),
            Err(DataError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let input = record_from_json(json!({"baseURL": "https://a.com", "color": "red"}));
        let error = prepare(&schema(), input, Mode::Create).unwrap_err();
        assert_eq!(error.to_string(), "Site: unknown attribute color");
    }

    #[test]
    fn test_list_of_strings_normalizes_to_set() {
        let input = record_from_json(json!({"baseURL": "https://a.com", "tags": ["b", "a", "b"]}));
        let record = prepare(&schema(), input, Mode::Create).unwrap();
        assert_eq!(record.get("tags"), Some(&string_set(["a", "b"])));
    }

    #[test]
    fn test_update_rejects_changed_read_only_attribute() {
        let schema = schema();
        let stored = prepare(
            &schema,
            record_from_json(json!({"baseURL": "https://a.com"})),
            Mode::Create,
        )
        .unwrap();

        let mut candidate = stored.clone();
        candidate.insert("siteId".to_string(), Value::from(uuid::Uuid::new_v4().to_string()));

        let error = prepare(&schema, candidate, Mode::Update { stored: &stored }).unwrap_err();
        assert_eq!(
            error,
            DataError::ReadOnlyViolation {
                entity: "Site".to_string(),
                attribute: "siteId".to_string(),
            }
        );
    }

    #[test]
    fn test_update_does_not_apply_defaults() {
        let schema = schema();
        let stored = prepare(
            &schema,
            record_from_json(json!({"baseURL": "https://a.com"})),
            Mode::Create,
        )
        .unwrap();

        let mut candidate = stored.clone();
        candidate.remove("deliveryType");
        let record = prepare(&schema, candidate, Mode::Update { stored: &stored }).unwrap();
        assert!(!record.contains_key("deliveryType"));
    }

    #[test]
    fn test_validate_attribute() {
        let schema = schema();
        assert_eq!(
            validate_attribute(&schema, "name", Value::from("Acme")).unwrap(),
            Value::from("Acme")
        );
        assert_eq!(
            validate_attribute(&schema, "name", Value::Null).unwrap(),
            Value::Null
        );
        assert!(matches!(
            validate_attribute(&schema, "baseURL", Value::Null),
            Err(DataError::MissingAttribute { .. })
        ));
        assert!(validate_attribute(&schema, "missing", Value::Bool(true)).is_err());
    }
}
