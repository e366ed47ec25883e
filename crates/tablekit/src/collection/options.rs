use tablekit_core::keys::SortRange;
use tablekit_core::{Predicate, Record, SortOrder, Value};

use crate::model::Model;

/// Options accepted by the query operations of a collection.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Index id to query instead of the one chosen from the keys.
    pub index: Option<String>,
    /// Store order on the index sort key; descending when unset.
    pub order: Option<SortOrder>,
    /// Page size. Without a limit every page is fetched.
    pub limit: Option<usize>,
    /// Resume after the page that returned this cursor.
    pub cursor: Option<String>,
    /// Return a [`QueryOutput::Page`] carrying the continuation cursor.
    pub return_cursor: bool,
    /// Range over the next sort attribute after the provided keys.
    pub between: Option<SortRange>,
    /// Filter evaluated by the store.
    pub where_: Option<Predicate>,
    /// Overrides the default: fetch every page when no limit is set.
    pub fetch_all_pages: Option<bool>,
    /// In-memory sort applied after fetching.
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, index: &str) -> Self {
        self.index = Some(index.to_string());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn return_cursor(mut self) -> Self {
        self.return_cursor = true;
        self
    }

    pub fn between(mut self, attribute: &str, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        self.between = Some(SortRange {
            attribute: attribute.to_string(),
            start: start.into(),
            end: end.into(),
        });
        self
    }

    /// Adds a filter; repeated calls are combined with `AND`.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.where_ = Some(match self.where_.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn fetch_all_pages(mut self, fetch_all: bool) -> Self {
        self.fetch_all_pages = Some(fetch_all);
        self
    }

    pub fn sort_by(mut self, attribute: &str, order: SortOrder) -> Self {
        self.sort_by = Some(attribute.to_string());
        self.sort_order = order;
        self
    }

    pub(crate) fn should_fetch_all_pages(&self) -> bool {
        self.fetch_all_pages.unwrap_or(self.limit.is_none())
    }
}

/// Result of a listing query.
#[derive(Debug, Clone)]
pub enum QueryOutput {
    Items(Vec<Model>),
    /// Returned when `return_cursor` is set; `cursor` is `None` once the results are exhausted.
    Page {
        data: Vec<Model>,
        cursor: Option<String>,
    },
}

impl QueryOutput {
    pub fn data(&self) -> &[Model] {
        match self {
            QueryOutput::Items(data) | QueryOutput::Page { data, .. } => data,
        }
    }

    pub fn into_data(self) -> Vec<Model> {
        match self {
            QueryOutput::Items(data) | QueryOutput::Page { data, .. } => data,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        match self {
            QueryOutput::Items(_) => None,
            QueryOutput::Page { cursor, .. } => cursor.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

/// One item `create_many` could not create.
#[derive(Debug, Clone)]
pub struct FailedItem {
    pub item: Record,
    pub error: tablekit_core::DataError,
}

/// Outcome of `create_many`: what was written and what was not.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusCreateResult {
    pub created_items: Vec<Model>,
    pub error_items: Vec<FailedItem>,
}

/// Outcome of `batch_get_by_keys`.
#[derive(Debug, Clone, Default)]
pub struct BatchGetResult {
    pub data: Vec<Model>,
    /// Keys the store did not process; retry them.
    pub unprocessed: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_all_pages_defaults_to_unlimited_queries() {
        assert!(QueryOptions::new().should_fetch_all_pages());
        assert!(!QueryOptions::new().limit(10).should_fetch_all_pages());
        assert!(QueryOptions::new()
            .limit(10)
            .fetch_all_pages(true)
            .should_fetch_all_pages());
        assert!(!QueryOptions::new().fetch_all_pages(false).should_fetch_all_pages());
    }

    #[test]
    fn test_filters_are_combined() {
        let options = QueryOptions::new()
            .filter(Predicate::eq("enabled", true))
            .filter(Predicate::contains("audits", "cwv"));

        assert_eq!(
            options.where_,
            Some(Predicate::And(vec![
                Predicate::eq("enabled", true),
                Predicate::contains("audits", "cwv"),
            ]))
        );
    }
}
