//! Entity registry, collections and models over a single-table store.
//!
//! The pure pieces (schemas, validation, key composition, predicates, cursors) live in
//! `tablekit_core`. This crate is the shell around them: store backends, the registry handle,
//! the generic [`Collection`] engine, [`Model`] instances and the built-in entities.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tablekit::{build_registry, Config, InMemoryStore, QueryOptions};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = build_registry(Arc::new(InMemoryStore::new()), &Config::from_env())?;
//! let sites = registry.collection("Site")?;
//! let listed = sites.all(QueryOptions::new().limit(10).return_cursor()).await?;
//! println!("{} sites, next page: {:?}", listed.len(), listed.cursor());
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod config;
pub mod dual_write;
pub mod entities;
pub mod model;
pub mod registry;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use collection::{
    BatchGetResult, Collection, CollectionExtension, FailedItem, MultiStatusCreateResult,
    NoExtension, QueryOptions, QueryOutput,
};
pub use config::Config;
pub use model::Model;
pub use registry::{build_registry, Registry, RegistryBuilder, RegistryConfig, RegistryError};

#[cfg(feature = "inmemory")]
pub use storage::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use storage::DynamoDbStore;

pub use tablekit_core::{DataError, Predicate, Record, SortOrder, Value};
