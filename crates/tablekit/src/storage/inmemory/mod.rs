//! In-memory storage backend for testing.
//!
//! Provides an implementation of [`tablekit_core::storage::Store`] that keeps all items in a
//! `BTreeMap` wrapped in `Arc<RwLock<_>>`. Useful for tests and development where persistence is
//! not required.
//!
//! # Example
//!
//! ```rust,ignore
//! use tablekit::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! // Hand the store to `build_registry`...
//! ```

mod store;

pub use store::InMemoryStore;
