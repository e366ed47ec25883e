//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the
//! [`tablekit_core::storage::Store`] trait using `aws-sdk-dynamodb`. Every entity lives in one
//! table keyed by `pk`/`sk`, with generic `gsiNpk`/`gsiNsk` secondary indexes.

mod conversions;
mod error;
mod store;

pub use store::DynamoDbStore;
