//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB `AttributeValue` maps and store items.
//! These are testable in isolation without DynamoDB access.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;
use tablekit_core::storage::{ContinuationKey, Item, PrimaryKey, StoreError};
use tablekit_core::schema::{TABLE_PK, TABLE_SK};
use tablekit_core::Value;

/// Convert a value to its DynamoDB representation.
///
/// Returns `None` for an empty string set, which DynamoDB cannot store. Nested empty sets become
/// empty lists so list positions and map entries are kept.
pub fn value_to_attribute(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::StringSet(set) if set.is_empty() => None,
        other => Some(nested_attribute(other)),
    }
}

fn nested_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(format_number(*n)),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::StringSet(set) if set.is_empty() => AttributeValue::L(Vec::new()),
        Value::StringSet(set) => AttributeValue::Ss(set.iter().cloned().collect()),
        Value::List(items) => AttributeValue::L(items.iter().map(nested_attribute).collect()),
        Value::Map(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), nested_attribute(v)))
                .collect(),
        ),
    }
}

/// Convert a DynamoDB attribute back to a value.
pub fn attribute_to_value(attribute: &AttributeValue) -> Result<Value, StoreError> {
    match attribute {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::N(n) => n
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|e| StoreError::Serialization(format!("Invalid number '{}': {}", n, e))),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::Ss(set) => Ok(Value::StringSet(set.iter().cloned().collect())),
        AttributeValue::L(items) => items
            .iter()
            .map(attribute_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        AttributeValue::M(map) => map
            .iter()
            .map(|(k, v)| attribute_to_value(v).map(|value| (k.clone(), value)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Map),
        other => Err(StoreError::InvalidData(format!(
            "Unsupported attribute type: {:?}",
            other
        ))),
    }
}

/// Convert a store item to a DynamoDB item.
pub fn item_to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .filter_map(|(name, value)| value_to_attribute(value).map(|a| (name.clone(), a)))
        .collect()
}

/// Convert a DynamoDB item to a store item.
pub fn attributes_to_item(attributes: &HashMap<String, AttributeValue>) -> Result<Item, StoreError> {
    attributes
        .iter()
        .map(|(name, attribute)| attribute_to_value(attribute).map(|value| (name.clone(), value)))
        .collect()
}

/// Table key attributes of a primary key.
pub fn key_attributes(key: &PrimaryKey) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (TABLE_PK.to_string(), AttributeValue::S(key.pk.clone())),
        (TABLE_SK.to_string(), AttributeValue::S(key.sk.clone())),
    ])
}

/// Read the table key back from a DynamoDB key map.
pub fn attributes_to_key(attributes: &HashMap<String, AttributeValue>) -> Result<PrimaryKey, StoreError> {
    Ok(PrimaryKey::new(
        get_string(attributes, TABLE_PK)?,
        get_string(attributes, TABLE_SK)?,
    ))
}

pub fn continuation_to_attributes(key: &ContinuationKey) -> HashMap<String, AttributeValue> {
    key.iter()
        .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
        .collect()
}

pub fn attributes_to_continuation(
    attributes: &HashMap<String, AttributeValue>,
) -> Result<ContinuationKey, StoreError> {
    attributes
        .keys()
        .map(|name| get_string(attributes, name).map(|value| (name.clone(), value)))
        .collect()
}

// ============================================================================
// Helper functions
// ============================================================================

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn get_string(item: &HashMap<String, AttributeValue>, field: &str) -> Result<String, StoreError> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", field)))
}
