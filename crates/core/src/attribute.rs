//! Attribute specifications.
//!
//! An [`AttributeSpec`] carries the per-field rules consulted by the validator: type, required,
//! read-only, default and an optional custom predicate.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::value::Value;

/// Custom attribute predicate. `Err` carries a human readable reason.
pub type AttributeCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Zero-argument default generator.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Boolean,
    List,
    Map,
    StringSet,
    Enum(Vec<String>),
    Any,
}

impl AttributeType {
    /// Builds an enum type from its allowed members.
    pub fn one_of<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeType::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Whether `value` has this type. `Null` never matches.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => false,
            (AttributeType::Any, _) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Number, Value::Number(_)) => true,
            (AttributeType::Boolean, Value::Bool(_)) => true,
            (AttributeType::List, Value::List(_)) => true,
            (AttributeType::Map, Value::Map(_)) => true,
            (AttributeType::StringSet, Value::StringSet(_)) => true,
            (AttributeType::Enum(members), Value::String(s)) => members.iter().any(|m| m == s),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttributeType::String => "string".to_string(),
            AttributeType::Number => "number".to_string(),
            AttributeType::Boolean => "boolean".to_string(),
            AttributeType::List => "list".to_string(),
            AttributeType::Map => "map".to_string(),
            AttributeType::StringSet => "set".to_string(),
            AttributeType::Enum(members) => format!("one of [{}]", members.join(", ")),
            AttributeType::Any => "any".to_string(),
        }
    }
}

/// Default applied when an attribute is absent on create.
#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    Generated(DefaultFn),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Generated(generate) => generate(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// Per-attribute rules.
#[derive(Clone)]
pub struct AttributeSpec {
    pub attribute_type: AttributeType,
    pub required: bool,
    pub read_only: bool,
    pub default: Option<DefaultValue>,
    pub check: Option<AttributeCheck>,
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("attribute_type", &self.attribute_type)
            .field("required", &self.required)
            .field("read_only", &self.read_only)
            .field("default", &self.default)
            .field("check", &self.check.as_ref().map(|_| ".."))
            .finish()
    }
}

impl AttributeSpec {
    pub fn new(attribute_type: AttributeType) -> Self {
        Self {
            attribute_type,
            required: false,
            read_only: false,
            default: None,
            check: None,
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    pub fn number() -> Self {
        Self::new(AttributeType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(AttributeType::Boolean)
    }

    pub fn list() -> Self {
        Self::new(AttributeType::List)
    }

    pub fn map() -> Self {
        Self::new(AttributeType::Map)
    }

    pub fn string_set() -> Self {
        Self::new(AttributeType::StringSet)
    }

    pub fn one_of<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AttributeType::one_of(members))
    }

    pub fn any() -> Self {
        Self::new(AttributeType::Any)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    pub fn default_with<F>(mut self, generate: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Generated(Arc::new(generate)));
        self
    }

    /// Boolean predicate; `false` becomes a validation failure.
    pub fn validate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(move |value| {
            if predicate(value) {
                Ok(())
            } else {
                Err("failed validation".to_string())
            }
        }));
        self
    }

    /// Predicate reporting its own failure reason.
    pub fn validate_with<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }
}

/// Current time in the RFC 3339 form stored for timestamps.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_uuid() -> Value {
    Value::String(Uuid::new_v4().to_string())
}

pub fn is_uuid(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| Uuid::parse_str(s).is_ok())
}

pub fn is_iso_date(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
}

/// Absolute http(s) URL.
pub fn is_http_url(value: &Value) -> bool {
    value
        .as_str()
        .and_then(|s| url::Url::parse(s).ok())
        .is_some_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
}

pub fn is_non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_accepts_matching_values() {
        assert!(AttributeType::String.accepts(&Value::from("x")));
        assert!(!AttributeType::String.accepts(&Value::Number(1.0)));
        assert!(AttributeType::Any.accepts(&Value::Bool(false)));
        assert!(!AttributeType::Any.accepts(&Value::Null));
    }

    #[test]
    fn test_enum_type_accepts_only_members() {
        let kind = AttributeType::one_of(["aem_edge", "aem_cs", "other"]);
        assert!(kind.accepts(&Value::from("aem_cs")));
        assert!(!kind.accepts(&Value::from("wordpress")));
        assert_eq!(kind.describe(), "one of [aem_edge, aem_cs, other]");
    }

    #[test]
    fn test_default_value_produce() {
        let fixed = DefaultValue::Static(Value::from("ACTIVE"));
        assert_eq!(fixed.produce(), Value::from("ACTIVE"));

        let generated = AttributeSpec::string().default_with(new_uuid);
        let value = generated.default.unwrap().produce();
        assert!(is_uuid(&value));
    }

    #[test]
    fn test_validate_wraps_boolean_predicate() {
        let spec = AttributeSpec::string().validate(is_non_empty_string);
        let check = spec.check.unwrap();
        assert!(check(&Value::from("abc")).is_ok());
        assert_eq!(
            check(&Value::from("  ")),
            Err("failed validation".to_string())
        );
    }

    #[test]
    fn test_builtin_predicates() {
        assert!(is_uuid(&Value::from("550e8400-e29b-41d4-a716-446655440000")));
        assert!(!is_uuid(&Value::from("not-a-uuid")));
        assert!(is_iso_date(&Value::from("2024-06-15T10:00:00.000Z")));
        assert!(!is_iso_date(&Value::from("2024-06-15")));
        assert!(is_http_url(&Value::from("https://www.example.com")));
        assert!(!is_http_url(&Value::from("ftp://example.com")));
        assert!(!is_http_url(&Value::from("example.com")));
    }

    #[test]
    fn test_now_timestamp_is_iso_date() {
        assert!(is_iso_date(&Value::from(now_timestamp())));
    }
}
