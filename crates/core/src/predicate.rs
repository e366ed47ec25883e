//! Filter predicates for index queries.
//!
//! A [`Predicate`] renders to a store filter expression with `#n`/`:v` placeholders so the store
//! evaluates it server-side, and can also be evaluated against a record directly.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::value::{Record, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    Lt(String, Value),
    Le(String, Value),
    Between(String, Value, Value),
    BeginsWith(String, String),
    /// Set or list membership, substring for strings.
    Contains(String, Value),
    Exists(String),
    NotExists(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Eq(attribute.to_string(), value.into())
    }

    pub fn ne(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Ne(attribute.to_string(), value.into())
    }

    pub fn gt(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Gt(attribute.to_string(), value.into())
    }

    pub fn ge(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Ge(attribute.to_string(), value.into())
    }

    pub fn lt(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Lt(attribute.to_string(), value.into())
    }

    pub fn le(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Le(attribute.to_string(), value.into())
    }

    pub fn between(attribute: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Predicate::Between(attribute.to_string(), low.into(), high.into())
    }

    pub fn begins_with(attribute: &str, prefix: impl Into<String>) -> Self {
        Predicate::BeginsWith(attribute.to_string(), prefix.into())
    }

    pub fn contains(attribute: &str, value: impl Into<Value>) -> Self {
        Predicate::Contains(attribute.to_string(), value.into())
    }

    pub fn exists(attribute: &str) -> Self {
        Predicate::Exists(attribute.to_string())
    }

    pub fn not_exists(attribute: &str) -> Self {
        Predicate::NotExists(attribute.to_string())
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut all) => {
                all.push(other);
                Predicate::And(all)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut any) => {
                any.push(other);
                Predicate::Or(any)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction of equality checks, `None` when `pairs` is empty.
    pub fn all_eq<'a>(pairs: impl IntoIterator<Item = (&'a String, &'a Value)>) -> Option<Self> {
        let mut terms: Vec<Predicate> = pairs
            .into_iter()
            .map(|(name, value)| Predicate::Eq(name.clone(), value.clone()))
            .collect();
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Predicate::And(terms)),
        }
    }

    /// Evaluates the predicate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        let value_of = |name: &str| record.get(name).filter(|v| !v.is_null());
        let compare = |name: &str, expected: &Value| {
            value_of(name).and_then(|actual| actual.partial_cmp_natural(expected))
        };

        match self {
            Predicate::Eq(name, expected) => value_of(name) == Some(expected),
            Predicate::Ne(name, expected) => value_of(name) != Some(expected),
            Predicate::Gt(name, expected) => compare(name, expected) == Some(Ordering::Greater),
            Predicate::Ge(name, expected) => matches!(
                compare(name, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Predicate::Lt(name, expected) => compare(name, expected) == Some(Ordering::Less),
            Predicate::Le(name, expected) => matches!(
                compare(name, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Predicate::Between(name, low, high) => {
                matches!(
                    compare(name, low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(compare(name, high), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::BeginsWith(name, prefix) => value_of(name)
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Predicate::Contains(name, needle) => {
                value_of(name).is_some_and(|haystack| haystack.contains(needle))
            }
            Predicate::Exists(name) => value_of(name).is_some(),
            Predicate::NotExists(name) => value_of(name).is_none(),
            Predicate::And(all) => all.iter().all(|p| p.matches(record)),
            Predicate::Or(any) => any.iter().any(|p| p.matches(record)),
            Predicate::Not(inner) => !inner.matches(record),
        }
    }

    /// Renders the predicate as a store filter expression.
    pub fn to_filter_expression(&self) -> FilterExpression {
        let mut out = FilterExpression::default();
        out.expression = out.render(self);
        out
    }
}

/// A filter expression with its attribute name and value placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    pub expression: String,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, Value>,
}

impl FilterExpression {
    fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, name)| *name == attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: &Value) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value.clone());
        placeholder
    }

    fn binary(&mut self, attribute: &str, operator: &str, value: &Value) -> String {
        let name = self.name(attribute);
        let value = self.value(value);
        format!("{name} {operator} {value}")
    }

    fn join(&mut self, predicates: &[Predicate], operator: &str) -> String {
        let parts: Vec<String> = predicates.iter().map(|p| self.render(p)).collect();
        format!("({})", parts.join(&format!(" {operator} ")))
    }

    fn render(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Eq(name, value) => self.binary(name, "=", value),
            Predicate::Ne(name, value) => self.binary(name, "<>", value),
            Predicate::Gt(name, value) => self.binary(name, ">", value),
            Predicate::Ge(name, value) => self.binary(name, ">=", value),
            Predicate::Lt(name, value) => self.binary(name, "<", value),
            Predicate::Le(name, value) => self.binary(name, "<=", value),
            Predicate::Between(name, low, high) => {
                let name = self.name(name);
                let low = self.value(low);
                let high = self.value(high);
                format!("{name} BETWEEN {low} AND {high}")
            }
            Predicate::BeginsWith(name, prefix) => {
                let name = self.name(name);
                let value = self.value(&Value::String(prefix.clone()));
                format!("begins_with({name}, {value})")
            }
            Predicate::Contains(name, needle) => {
                let name = self.name(name);
                let value = self.value(needle);
                format!("contains({name}, {value})")
            }
            Predicate::Exists(name) => format!("attribute_exists({})", self.name(name)),
            Predicate::NotExists(name) => format!("attribute_not_exists({})", self.name(name)),
            Predicate::And(all) => self.join(all, "AND"),
            Predicate::Or(any) => self.join(any, "OR"),
            Predicate::Not(inner) => format!("(NOT {})", self.render(inner)),
        }
    }
}
