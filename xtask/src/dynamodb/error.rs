//! Error types for DynamoDB operations.

use tablekit_core::SchemaError;
use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB operations.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Entity schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Table '{table_name}' is incompatible: {reason}")]
    IncompatibleTable { table_name: String, reason: String },

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Timeout waiting for table to become active")]
    TableActivationTimeout,
}
