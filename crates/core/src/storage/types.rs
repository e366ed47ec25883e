use std::collections::BTreeMap;
use std::fmt;

use crate::predicate::Predicate;
use crate::schema::{IndexDef, TABLE_PK, TABLE_SK};
use crate::value::{Record, Value};

/// A physical store item: key fields, `entityType` and the entity attributes.
pub type Item = Record;

/// Continuation key returned by a query page, keyed by physical field name.
pub type ContinuationKey = BTreeMap<String, String>;

/// Maximum items per batch write request.
pub const MAX_BATCH_WRITE: usize = 25;

/// Maximum keys per batch get request.
pub const MAX_BATCH_GET: usize = 100;

/// Table key of a single item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey {
    pub pk: String,
    pub sk: String,
}

impl PrimaryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Reads the table key fields of an item.
    pub fn of_item(item: &Item) -> Option<Self> {
        let pk = item.get(TABLE_PK).and_then(Value::as_str)?;
        let sk = item.get(TABLE_SK).and_then(Value::as_str)?;
        Some(Self::new(pk, sk))
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

/// Existence condition attached to a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Fails with `AlreadyExists` when the key is taken.
    Create,
    /// Fails with `NotFound` when the key is free.
    Replace,
    Upsert,
}

/// Key condition on an index's sort field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCondition {
    Eq(String),
    BeginsWith(String),
    /// Inclusive on both ends.
    Between(String, String),
}

impl SortCondition {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            SortCondition::Eq(expected) => value == expected,
            SortCondition::BeginsWith(prefix) => value.starts_with(prefix.as_str()),
            SortCondition::Between(low, high) => value >= low.as_str() && value <= high.as_str(),
        }
    }
}

/// A bounded query against the table key or one GSI.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// GSI name; `None` queries the table key.
    pub index_name: Option<String>,
    pub pk_field: String,
    pub pk_value: String,
    pub sk_field: String,
    pub sort: Option<SortCondition>,
    /// Server-side filter applied after the key condition.
    pub filter: Option<Predicate>,
    /// Maximum items evaluated for this page.
    pub limit: Option<usize>,
    pub exclusive_start: Option<ContinuationKey>,
    pub ascending: bool,
}

impl QueryRequest {
    /// Query on one partition of `index`, descending, unfiltered.
    pub fn on(index: &IndexDef, pk_value: impl Into<String>) -> Self {
        Self {
            index_name: index.physical_name.clone(),
            pk_field: index.pk_field.clone(),
            pk_value: pk_value.into(),
            sk_field: index.sk_field.clone(),
            sort: None,
            filter: None,
            limit: None,
            exclusive_start: None,
            ascending: false,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// `None` once the query is exhausted.
    pub last_evaluated: Option<ContinuationKey>,
}

/// Writes a batch could not apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutcome {
    pub unprocessed_puts: Vec<Item>,
    pub unprocessed_deletes: Vec<PrimaryKey>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchGetOutcome {
    pub items: Vec<Item>,
    pub unprocessed: Vec<PrimaryKey>,
}
