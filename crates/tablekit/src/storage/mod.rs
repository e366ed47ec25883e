//! Store backend implementations.
//!
//! This module provides concrete implementations of the [`tablekit_core::storage::Store`] trait,
//! selected at compile time via feature flags. Both backends can be enabled together; the registry
//! only sees `Arc<dyn Store>`.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process store used by tests and local development
//! - `dynamodb`: AWS DynamoDB single-table backend using `aws-sdk-dynamodb`
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p tablekit --features dynamodb
//! ```

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p tablekit --features dynamodb"
);

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
