//! Entity registry: entity name to schema and collection extension, plus shared configuration.
//!
//! A [`Registry`] is an explicit, cheaply clonable handle. It is built once with
//! [`RegistryBuilder`] (or [`build_registry`] for the built-in entities); every reference target
//! and every entity an extension writes to must be registered, or the build fails.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use tablekit_core::schema::ReferenceKind;
use tablekit_core::storage::{Store, MAX_BATCH_WRITE};
use tablekit_core::{DataError, Schema, SchemaError};

use crate::collection::{Collection, CollectionExtension, NoExtension};
use crate::config::Config;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Entity {0} is registered more than once")]
    DuplicateEntity(String),

    #[error("Entity {entity} references unregistered entity {target}")]
    UnknownReference { entity: String, target: String },

    #[error("Entity {entity} writes to unregistered entity {target}")]
    UnknownDependency { entity: String, target: String },

    #[error("Entity {0} is not registered")]
    UnknownEntity(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<RegistryError> for DataError {
    fn from(err: RegistryError) -> Self {
        let entity = match &err {
            RegistryError::DuplicateEntity(entity) | RegistryError::UnknownEntity(entity) => {
                entity.clone()
            }
            RegistryError::UnknownReference { entity, .. }
            | RegistryError::UnknownDependency { entity, .. } => entity.clone(),
            RegistryError::Schema(_) => "Registry".to_string(),
        };
        DataError::InvalidInput {
            entity,
            message: err.to_string(),
        }
    }
}

/// Shared, read-mostly configuration visible to every collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// IMS organizations allowed to own service-to-service consumers.
    pub s2s_allowed_ims_org_ids: Vec<String>,
}

impl From<&Config> for RegistryConfig {
    fn from(config: &Config) -> Self {
        Self {
            s2s_allowed_ims_org_ids: config.s2s_allowed_ims_org_ids.clone(),
        }
    }
}

pub(crate) struct Entry {
    pub(crate) schema: Schema,
    pub(crate) extension: Arc<dyn CollectionExtension>,
}

struct Inner {
    store: Arc<dyn Store>,
    entries: BTreeMap<String, Arc<Entry>>,
    config: RwLock<RegistryConfig>,
    batch_size: usize,
}

/// Handle to a built registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entities", &self.inner.entries.keys().collect::<Vec<_>>())
            .field("batch_size", &self.inner.batch_size)
            .finish()
    }
}

impl Registry {
    pub fn builder(store: Arc<dyn Store>) -> RegistryBuilder {
        RegistryBuilder::new(store)
    }

    /// Collection for a registered entity, e.g. `"SiteEnrollment"`.
    pub fn collection(&self, entity: &str) -> Result<Collection, RegistryError> {
        self.inner
            .entries
            .get(entity)
            .map(|entry| Collection::new(self.clone(), Arc::clone(entry)))
            .ok_or_else(|| RegistryError::UnknownEntity(entity.to_string()))
    }

    pub fn schema(&self, entity: &str) -> Option<&Schema> {
        self.inner.entries.get(entity).map(|entry| &entry.schema)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.inner.entries.values().map(|entry| &entry.schema)
    }

    /// Decapitalized names of every registered entity, e.g. `siteEnrollment`.
    pub fn entity_names(&self) -> Vec<String> {
        self.schemas().map(Schema::model_name).collect()
    }

    /// Largest number of GSI slots used by any entity; the table needs this many.
    pub fn gsi_count(&self) -> usize {
        self.schemas().map(Schema::gsi_count).max().unwrap_or(0)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub(crate) fn batch_size(&self) -> usize {
        self.inner.batch_size
    }

    /// Snapshot of the shared configuration.
    pub fn config(&self) -> RegistryConfig {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates the shared configuration. Intended for setup, before concurrent use.
    pub fn update_config(&self, update: impl FnOnce(&mut RegistryConfig)) {
        let mut config = self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut config);
    }
}

/// Collects schemas and extensions, then checks them as a whole.
pub struct RegistryBuilder {
    store: Arc<dyn Store>,
    entries: Vec<Entry>,
    config: RegistryConfig,
    batch_size: usize,
}

impl RegistryBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            entries: Vec::new(),
            config: RegistryConfig::default(),
            batch_size: MAX_BATCH_WRITE,
        }
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Items per batch write, clamped to the store limit.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_WRITE);
        self
    }

    pub fn register(mut self, schema: Schema, extension: impl CollectionExtension + 'static) -> Self {
        self.entries.push(Entry {
            schema,
            extension: Arc::new(extension),
        });
        self
    }

    /// Registers an entity without entity-specific behavior.
    pub fn register_plain(self, schema: Schema) -> Self {
        self.register(schema, NoExtension)
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut entries = BTreeMap::new();
        for entry in self.entries {
            let name = entry.schema.entity_name().to_string();
            if entries.insert(name.clone(), Arc::new(entry)).is_some() {
                return Err(RegistryError::DuplicateEntity(name));
            }
        }

        let names: BTreeSet<&String> = entries.keys().collect();
        for (name, entry) in &entries {
            for reference in entry.schema.references() {
                if !names.contains(&reference.target) {
                    return Err(RegistryError::UnknownReference {
                        entity: name.clone(),
                        target: reference.target.clone(),
                    });
                }
            }
            for target in entry.extension.dependencies() {
                if !names.contains(&target.to_string()) {
                    return Err(RegistryError::UnknownDependency {
                        entity: name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            entities = entries.len(),
            belongs_to = entries
                .values()
                .flat_map(|e| e.schema.references())
                .filter(|r| r.kind == ReferenceKind::BelongsTo)
                .count(),
            "Built entity registry"
        );

        Ok(Registry {
            inner: Arc::new(Inner {
                store: self.store,
                entries,
                config: RwLock::new(self.config),
                batch_size: self.batch_size,
            }),
        })
    }
}

/// Builds a registry holding every built-in entity.
pub fn build_registry(store: Arc<dyn Store>, config: &Config) -> Result<Registry, RegistryError> {
    crate::entities::register_all(
        Registry::builder(store)
            .with_config(RegistryConfig::from(config))
            .with_batch_size(config.batch_size),
    )?
    .build()
}
