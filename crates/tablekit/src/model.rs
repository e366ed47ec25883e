//! A single entity instance bound to its collection.

use std::collections::BTreeSet;
use std::fmt;

use tablekit_core::attribute::now_timestamp;
use tablekit_core::keys::compose_key;
use tablekit_core::schema::naming::foreign_key_for;
use tablekit_core::schema::{Accessor, ReferenceKind, CREATED_AT, UPDATED_AT};
use tablekit_core::storage::PrimaryKey;
use tablekit_core::validate::{prepare, validate_attribute, Mode};
use tablekit_core::{record_to_json, DataError, Record, Result, Schema, Value};

use crate::collection::{Collection, QueryOptions, QueryOutput};

/// An entity instance. Changes made with [`Model::set`] stay local until [`Model::save`].
#[derive(Clone)]
pub struct Model {
    collection: Collection,
    record: Record,
    /// Last persisted state; read-only checks compare against it.
    original: Record,
    dirty: bool,
    removed: bool,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("entity", &self.entity_name())
            .field("record", &self.record)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Model {
    pub(crate) fn hydrate(collection: Collection, record: Record) -> Self {
        Self {
            collection,
            original: record.clone(),
            record,
            dirty: false,
            removed: false,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn schema(&self) -> &Schema {
        self.collection.schema()
    }

    pub fn entity_name(&self) -> &str {
        self.collection.entity_name()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn to_json(&self) -> serde_json::Value {
        record_to_json(&self.record)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// The generated id, e.g. the value of `siteId` for a site.
    pub fn id(&self) -> Option<&str> {
        self.get_str(self.schema().id_name())
    }

    pub fn created_at(&self) -> Option<&str> {
        self.get_str(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.get_str(UPDATED_AT)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.record.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }

    pub fn get_bool(&self, attribute: &str) -> Option<bool> {
        self.get(attribute).and_then(Value::as_bool)
    }

    pub fn get_f64(&self, attribute: &str) -> Option<f64> {
        self.get(attribute).and_then(Value::as_f64)
    }

    pub fn get_list(&self, attribute: &str) -> Option<&[Value]> {
        self.get(attribute).and_then(Value::as_list)
    }

    pub fn get_string_set(&self, attribute: &str) -> Option<&BTreeSet<String>> {
        self.get(attribute).and_then(Value::as_string_set)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.removed {
            return Err(DataError::invalid_input(
                self.entity_name(),
                "the item has been removed",
            ));
        }
        Ok(())
    }

    /// Validates and assigns one attribute. `Value::Null` clears an optional attribute.
    ///
    /// Read-only attributes are refused and keep their value.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.ensure_live()?;
        let schema = self.collection.schema();
        if schema.attribute(attribute).is_some_and(|spec| spec.read_only) {
            return Err(DataError::ReadOnlyViolation {
                entity: self.entity_name().to_string(),
                attribute: attribute.to_string(),
            });
        }

        let value = validate_attribute(schema, attribute, value.into())?;
        if value.is_null() {
            self.record.remove(attribute);
        } else {
            self.record.insert(attribute.to_string(), value);
        }
        self.dirty = true;
        Ok(self)
    }

    /// Generated accessor table for this entity.
    pub fn accessors(&self) -> &[Accessor] {
        self.schema().accessors()
    }

    /// Reads through a generated getter name, e.g. `getBaseURL`.
    pub fn call_getter(&self, getter: &str) -> Result<Option<&Value>> {
        let accessor = self
            .accessors()
            .iter()
            .find(|accessor| accessor.getter == getter)
            .ok_or_else(|| {
                DataError::invalid_input(self.entity_name(), format!("unknown getter {getter}"))
            })?;
        Ok(self.get(&accessor.attribute))
    }

    /// Writes through a generated setter name, e.g. `setName`.
    pub fn call_setter(&mut self, setter: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let attribute = self
            .accessors()
            .iter()
            .find(|accessor| accessor.setter.as_deref() == Some(setter))
            .map(|accessor| accessor.attribute.clone())
            .ok_or_else(|| {
                DataError::invalid_input(self.entity_name(), format!("unknown setter {setter}"))
            })?;
        self.set(&attribute, value)
    }

    /// Persists pending changes. Does nothing when the model is clean.
    pub async fn save(&mut self) -> Result<&mut Self> {
        self.ensure_live()?;
        if !self.dirty {
            return Ok(self);
        }

        let mut record = prepare(
            self.schema(),
            self.record.clone(),
            Mode::Update {
                stored: &self.original,
            },
        )?;
        record.insert(UPDATED_AT.to_string(), Value::String(now_timestamp()));

        self.collection.replace(&record).await?;
        tracing::debug!(entity = %self.entity_name(), id = ?self.id(), "Saved item");

        self.original = record.clone();
        self.record = record;
        self.dirty = false;
        Ok(self)
    }

    /// Deletes the item. The model refuses further changes afterwards.
    pub async fn remove(&mut self) -> Result<()> {
        self.ensure_live()?;
        let keys = self.composite_keys()?;
        self.collection.remove_one(&keys).await?;
        self.removed = true;
        Ok(())
    }

    /// Primary key attributes and their values.
    pub fn composite_keys(&self) -> Result<Record> {
        let primary = self.schema().primary_index();
        primary
            .key_attributes()
            .map(|name| match self.original.get(name) {
                Some(value) => Ok((name.clone(), value.clone())),
                None => Err(DataError::MissingKeyAttribute {
                    entity: self.entity_name().to_string(),
                    index: primary.id.clone(),
                    attribute: name.clone(),
                }),
            })
            .collect()
    }

    pub fn primary_key(&self) -> Result<PrimaryKey> {
        Ok(compose_key(self.schema(), &self.original, None)?.to_primary_key())
    }

    fn reference(&self, target: &str, kind: ReferenceKind) -> Result<Collection> {
        match self.schema().reference_to(target) {
            Some(reference) if reference.kind == kind => {
                Ok(self.collection.registry().collection(target)?)
            }
            _ => Err(DataError::invalid_input(
                self.entity_name(),
                format!("no {kind:?} reference to {target}"),
            )),
        }
    }

    /// Keys selecting the items of `target` that point back at this one.
    fn back_reference_keys(&self) -> Result<Record> {
        let id_name = self.schema().id_name();
        let id = self.id().ok_or_else(|| DataError::MissingAttribute {
            entity: self.entity_name().to_string(),
            attribute: id_name.to_string(),
        })?;
        Ok(Record::from([(id_name.to_string(), Value::from(id))]))
    }

    /// Parent of a `belongs_to` reference; `None` when the foreign key is unset or dangling.
    pub async fn belongs_to(&self, target: &str) -> Result<Option<Model>> {
        let collection = self.reference(target, ReferenceKind::BelongsTo)?;
        match self.get_str(&foreign_key_for(target)) {
            Some(id) => collection.find_by_id(id).await,
            None => Ok(None),
        }
    }

    pub async fn has_one(&self, target: &str) -> Result<Option<Model>> {
        let collection = self.reference(target, ReferenceKind::HasOne)?;
        let keys = self.back_reference_keys()?;
        collection.find_by_index_keys(&keys, QueryOptions::new()).await
    }

    pub async fn has_many(&self, target: &str, options: QueryOptions) -> Result<QueryOutput> {
        let collection = self.reference(target, ReferenceKind::HasMany)?;
        let keys = self.back_reference_keys()?;
        collection.all_by_index_keys(&keys, options).await
    }
}
