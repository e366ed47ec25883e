//! Generic per-entity repository.
//!
//! A [`Collection`] pairs a registered schema with the registry's store. It validates input,
//! composes keys, plans queries against the primary key or a GSI and wraps stored items in
//! [`Model`]s. Entity-specific behavior comes from the entry's [`CollectionExtension`].

mod extension;
mod options;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tablekit_core::cursor;
use tablekit_core::dto::{from_store_item, to_store_item};
use tablekit_core::keys::{compose_key, compose_query, find_index_for_keys};
use tablekit_core::schema::Schema;
use tablekit_core::sorting::sort_by_attribute;
use tablekit_core::storage::{
    Item, PrimaryKey, PutMode, QueryRequest, Store, StoreError, MAX_BATCH_GET,
};
use tablekit_core::validate::{prepare, Mode};
use tablekit_core::{DataError, Predicate, Record, Result, SortOrder, Value};

pub use extension::{CollectionExtension, NoExtension};
pub use options::{BatchGetResult, FailedItem, MultiStatusCreateResult, QueryOptions, QueryOutput};

use crate::model::Model;
use crate::registry::{Entry, Registry};

#[derive(Clone)]
pub struct Collection {
    registry: Registry,
    entry: Arc<Entry>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("entity", &self.entity_name())
            .finish()
    }
}

impl Collection {
    pub(crate) fn new(registry: Registry, entry: Arc<Entry>) -> Self {
        Self { registry, entry }
    }

    pub fn schema(&self) -> &Schema {
        &self.entry.schema
    }

    pub fn entity_name(&self) -> &str {
        self.entry.schema.entity_name()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn store(&self) -> &Arc<dyn Store> {
        self.registry.store()
    }

    fn invalid_input(&self, message: impl Into<String>) -> DataError {
        DataError::invalid_input(self.entity_name(), message)
    }

    fn data_access(&self, operation: &'static str, source: StoreError) -> DataError {
        tracing::error!(
            entity = %self.entity_name(),
            operation,
            error = %source,
            "Store operation failed"
        );
        DataError::data_access(self.entity_name(), operation, source)
    }

    fn hydrate(&self, item: &Item) -> Result<Model> {
        let record = from_store_item(self.schema(), item)?;
        Ok(Model::hydrate(self.clone(), record))
    }

    /// Key attributes for an id lookup; only valid for entities keyed by their generated id.
    fn id_keys(&self, id: &str) -> Result<Record> {
        if !self.schema().is_single_id_keyed() {
            return Err(self.invalid_input(
                "lookup by id requires a single id key, use find_by_primary_key",
            ));
        }
        if id.trim().is_empty() {
            return Err(self.invalid_input("id is required"));
        }
        Ok(Record::from([(
            self.schema().id_name().to_string(),
            Value::String(id.to_string()),
        )]))
    }

    /// Domain checks, attribute validation and key composition for a new item.
    async fn prepare_create(&self, item: &Record) -> Result<(Record, Item)> {
        if item.is_empty() {
            return Err(self.invalid_input("item is required"));
        }
        self.entry.extension.before_create(self, item).await?;
        let record = prepare(self.schema(), item.clone(), Mode::Create)?;
        let stored = to_store_item(self.schema(), &record)?;
        Ok((record, stored))
    }

    /// Validates and writes one new item. Fails if its primary key is already taken.
    pub async fn create(&self, item: Record) -> Result<Model> {
        let (record, stored) = self.prepare_create(&item).await?;

        self.store()
            .put_item(stored, PutMode::Create)
            .await
            .map_err(|e| self.data_access("create", e))?;
        tracing::debug!(entity = %self.entity_name(), "Created item");

        let model = Model::hydrate(self.clone(), record);
        self.entry.extension.after_create(self, &model).await;
        Ok(model)
    }

    /// Creates many items; each one succeeds or fails on its own.
    ///
    /// Only an empty input is an error. Invalid items, items repeating the primary key of an
    /// earlier item in the same call and items the store left unprocessed are reported in
    /// `error_items`.
    ///
    /// Unlike [`Collection::create`], items are written as upserts: an item whose key is already
    /// stored replaces the stored one.
    pub async fn create_many(&self, items: Vec<Record>) -> Result<MultiStatusCreateResult> {
        if items.is_empty() {
            return Err(self.invalid_input("items must be a non-empty list"));
        }

        let mut result = MultiStatusCreateResult::default();
        let mut pending = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();
        for item in items {
            match self.prepare_create(&item).await {
                Ok((record, stored)) => match PrimaryKey::of_item(&stored) {
                    Some(key) if !seen.insert(key.clone()) => {
                        let error = DataError::rejected(
                            self.entity_name(),
                            format!("duplicate primary key {key} in batch"),
                        );
                        result.error_items.push(FailedItem { item, error });
                    }
                    _ => pending.push((item, record, stored)),
                },
                Err(error) => result.error_items.push(FailedItem { item, error }),
            }
        }

        for chunk in pending.chunks(self.registry.batch_size()) {
            let puts = chunk.iter().map(|(_, _, stored)| stored.clone()).collect();
            match self.store().batch_write(puts, Vec::new()).await {
                Ok(outcome) => {
                    let unprocessed: HashSet<PrimaryKey> = outcome
                        .unprocessed_puts
                        .iter()
                        .filter_map(PrimaryKey::of_item)
                        .collect();
                    if !unprocessed.is_empty() {
                        tracing::warn!(
                            entity = %self.entity_name(),
                            count = unprocessed.len(),
                            "Batch write left items unprocessed"
                        );
                    }
                    for (item, record, stored) in chunk {
                        let skipped = PrimaryKey::of_item(stored)
                            .is_some_and(|key| unprocessed.contains(&key));
                        if skipped {
                            result.error_items.push(FailedItem {
                                item: item.clone(),
                                error: DataError::data_access(
                                    self.entity_name(),
                                    "create_many",
                                    StoreError::QueryFailed(
                                        "item was not processed by the batch write".to_string(),
                                    ),
                                ),
                            });
                        } else {
                            result
                                .created_items
                                .push(Model::hydrate(self.clone(), record.clone()));
                        }
                    }
                }
                Err(err) => {
                    let error = self.data_access("create_many", err);
                    result
                        .error_items
                        .extend(chunk.iter().map(|(item, _, _)| FailedItem {
                            item: item.clone(),
                            error: error.clone(),
                        }));
                }
            }
        }

        tracing::info!(
            entity = %self.entity_name(),
            created = result.created_items.len(),
            failed = result.error_items.len(),
            "Created items in batch"
        );

        for model in &result.created_items {
            self.entry.extension.after_create(self, model).await;
        }
        Ok(result)
    }

    /// Finds an item by its generated id. `None` when absent.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Model>> {
        let keys = self.id_keys(id)?;
        self.find_by_primary_key(&keys).await
    }

    /// Like [`Collection::find_by_id`], but absence is a `NotFound` error.
    pub async fn get_by_id(&self, id: &str) -> Result<Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DataError::NotFound {
                entity: self.entity_name().to_string(),
                id: id.to_string(),
            })
    }

    pub async fn exists_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Point read by every primary key attribute.
    pub async fn find_by_primary_key(&self, keys: &Record) -> Result<Option<Model>> {
        let key = compose_key(self.schema(), keys, None)?.to_primary_key();
        let item = self
            .store()
            .get_item(&key)
            .await
            .map_err(|e| self.data_access("get", e))?;
        item.as_ref().map(|item| self.hydrate(item)).transpose()
    }

    /// Plans a query: chooses the index, splits the keys into key conditions and filters.
    ///
    /// The index consumes its partition attributes and the leading provided sort attributes;
    /// every other key becomes an equality filter.
    fn plan_query(&self, keys: &Record, options: &QueryOptions) -> Result<QueryRequest> {
        let schema = self.schema();
        if let Some(unknown) = keys.keys().find(|name| !schema.has_attribute(name)) {
            return Err(DataError::rejected(
                self.entity_name(),
                format!("unknown attribute {unknown}"),
            ));
        }
        if let Some(attribute) = options.sort_by.as_deref() {
            if !schema.has_attribute(attribute) {
                return Err(
                    self.invalid_input(format!("cannot sort by unknown attribute {attribute}"))
                );
            }
        }
        if options.limit == Some(0) {
            return Err(self.invalid_input("limit must be positive"));
        }

        let index = match &options.index {
            Some(id) => schema
                .index(id)
                .ok_or_else(|| self.invalid_input(format!("unknown index {id}")))?,
            None => find_index_for_keys(schema, keys)?,
        };

        let present = |name: &String| keys.get(name).is_some_and(|v| !v.is_null());
        let consumed: HashSet<&String> = index
            .partition
            .iter()
            .chain(index.sort.iter().take_while(|&name| present(name)))
            .collect();
        let index_keys: Record = keys
            .iter()
            .filter(|&(name, _)| consumed.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let extra = Predicate::all_eq(
            keys.iter()
                .filter(|&(name, value)| !consumed.contains(name) && !value.is_null()),
        );

        let query_key = compose_query(schema, index, &index_keys, options.between.as_ref())?;
        let exclusive_start = options
            .cursor
            .as_deref()
            .map(cursor::decode)
            .transpose()
            .map_err(|e| self.invalid_input(e.to_string()))?;

        let mut request = QueryRequest::on(index, query_key.pk_value);
        request.sort = query_key.sort;
        request.filter = match (extra, options.where_.clone()) {
            (Some(keys_filter), Some(filter)) => Some(keys_filter.and(filter)),
            (keys_filter, filter) => keys_filter.or(filter),
        };
        request.limit = options.limit;
        request.exclusive_start = exclusive_start;
        request.ascending = options.order == Some(SortOrder::Asc);
        Ok(request)
    }

    async fn run_query(&self, keys: &Record, options: QueryOptions) -> Result<QueryOutput> {
        let mut request = self.plan_query(keys, &options)?;
        let fetch_all = options.should_fetch_all_pages();

        let mut data = Vec::new();
        let last_evaluated = loop {
            let page = self
                .store()
                .query(&request)
                .await
                .map_err(|e| self.data_access("query", e))?;
            tracing::debug!(
                entity = %self.entity_name(),
                index = request.index_name.as_deref().unwrap_or("primary"),
                items = page.items.len(),
                more = page.last_evaluated.is_some(),
                "Fetched query page"
            );

            for item in &page.items {
                data.push(self.hydrate(item)?);
            }
            match page.last_evaluated {
                Some(key) if fetch_all => request.exclusive_start = Some(key),
                last => break last,
            }
        };

        if let Some(attribute) = &options.sort_by {
            sort_by_attribute(&mut data, attribute, options.sort_order, Model::record);
        }

        Ok(if options.return_cursor {
            QueryOutput::Page {
                data,
                cursor: cursor::encode_optional(last_evaluated.as_ref()),
            }
        } else {
            QueryOutput::Items(data)
        })
    }

    /// Lists items matching `keys` on the best serving index.
    pub async fn all_by_index_keys(&self, keys: &Record, options: QueryOptions) -> Result<QueryOutput> {
        if keys.is_empty() {
            return Err(self.invalid_input("keys are required"));
        }
        self.run_query(keys, options).await
    }

    /// Lists every item through the entity's `all` index.
    pub async fn all(&self, options: QueryOptions) -> Result<QueryOutput> {
        self.run_query(&Record::new(), options).await
    }

    /// First item matching `keys`, or `None`.
    ///
    /// Pages are read until a match is found, so filtered lookups never miss an item that sits
    /// behind non-matching ones.
    pub async fn find_by_index_keys(&self, keys: &Record, options: QueryOptions) -> Result<Option<Model>> {
        if keys.is_empty() {
            return Err(self.invalid_input("keys are required"));
        }
        let mut request = self.plan_query(keys, &options)?;
        request.limit = if request.filter.is_some() { None } else { Some(1) };

        loop {
            let page = self
                .store()
                .query(&request)
                .await
                .map_err(|e| self.data_access("query", e))?;
            if let Some(item) = page.items.first() {
                return self.hydrate(item).map(Some);
            }
            match page.last_evaluated {
                Some(key) => request.exclusive_start = Some(key),
                None => return Ok(None),
            }
        }
    }

    /// Point reads by primary key attributes, in store batches.
    pub async fn batch_get_by_keys(&self, keys: &[Record]) -> Result<BatchGetResult> {
        if keys.is_empty() {
            return Err(self.invalid_input("keys must be a non-empty list"));
        }

        let mut by_key = HashMap::with_capacity(keys.len());
        let mut primary_keys = Vec::with_capacity(keys.len());
        for key in keys {
            let primary = compose_key(self.schema(), key, None)?.to_primary_key();
            if by_key.insert(primary.clone(), key.clone()).is_none() {
                primary_keys.push(primary);
            }
        }

        let mut result = BatchGetResult::default();
        for chunk in primary_keys.chunks(MAX_BATCH_GET) {
            let outcome = self
                .store()
                .batch_get(chunk)
                .await
                .map_err(|e| self.data_access("batch_get", e))?;
            for item in &outcome.items {
                result.data.push(self.hydrate(item)?);
            }
            result.unprocessed.extend(
                outcome
                    .unprocessed
                    .iter()
                    .filter_map(|key| by_key.get(key).cloned()),
            );
        }

        Ok(result)
    }

    /// Removes items by primary key attributes.
    ///
    /// Every key is composed before the first delete, so one bad key removes nothing.
    pub async fn remove_by_index_keys(&self, keys: &[Record]) -> Result<()> {
        if keys.is_empty() {
            return Err(self.invalid_input("keys must be a non-empty list"));
        }
        let primary_keys = keys
            .iter()
            .map(|key| {
                if key.is_empty() {
                    return Err(self.invalid_input("key must be a non-empty object"));
                }
                compose_key(self.schema(), key, None).map(|composed| composed.to_primary_key())
            })
            .collect::<Result<Vec<_>>>()?;

        for chunk in primary_keys.chunks(self.registry.batch_size()) {
            let outcome = self
                .store()
                .batch_write(Vec::new(), chunk.to_vec())
                .await
                .map_err(|e| self.data_access("remove", e))?;
            for key in &outcome.unprocessed_deletes {
                tracing::warn!(entity = %self.entity_name(), key = %key, "Retrying unprocessed delete");
                self.store()
                    .delete_item(key)
                    .await
                    .map_err(|e| self.data_access("remove", e))?;
            }
        }
        tracing::info!(entity = %self.entity_name(), count = keys.len(), "Removed items");

        for key in keys {
            self.entry.extension.after_remove(self, key).await;
        }
        Ok(())
    }

    /// Removes items by generated id.
    pub async fn remove_by_ids(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Err(self.invalid_input("ids must be a non-empty list"));
        }
        let keys = ids
            .iter()
            .map(|id| self.id_keys(id))
            .collect::<Result<Vec<_>>>()?;
        self.remove_by_index_keys(&keys).await
    }

    /// Rewrites an existing item with a validated record.
    pub(crate) async fn replace(&self, record: &Record) -> Result<()> {
        let stored = to_store_item(self.schema(), record)?;
        self.store()
            .put_item(stored, PutMode::Replace)
            .await
            .map_err(|e| self.data_access("save", e))
    }

    /// Deletes one item and runs the remove hook.
    pub(crate) async fn remove_one(&self, keys: &Record) -> Result<()> {
        let key = compose_key(self.schema(), keys, None)?.to_primary_key();
        self.store()
            .delete_item(&key)
            .await
            .map_err(|e| self.data_access("remove", e))?;
        self.entry.extension.after_remove(self, keys).await;
        Ok(())
    }
}
