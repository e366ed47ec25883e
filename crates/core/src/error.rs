use thiserror::Error;

use crate::storage::StoreError;

/// Errors raised by the entity layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("{entity}: missing required attribute {attribute}")]
    MissingAttribute { entity: String, attribute: String },

    #[error("{entity}: {message}")]
    Validation {
        entity: String,
        attribute: Option<String>,
        message: String,
    },

    #[error("{entity}: attribute {attribute} is read-only")]
    ReadOnlyViolation { entity: String, attribute: String },

    #[error("{entity}: missing key attribute {attribute} for index {index}")]
    MissingKeyAttribute {
        entity: String,
        index: String,
        attribute: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity}: {operation} failed: {source}")]
    DataAccess {
        entity: String,
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{entity}: {message}")]
    InvalidInput { entity: String, message: String },
}

impl DataError {
    /// Attribute-level validation failure naming the offending value.
    pub fn invalid_attribute(
        entity: &str,
        attribute: &str,
        value: &crate::Value,
        reason: &str,
    ) -> Self {
        DataError::Validation {
            entity: entity.to_string(),
            attribute: Some(attribute.to_string()),
            message: format!("invalid value for {attribute}: {value} ({reason})"),
        }
    }

    /// Entity-level business rule failure.
    pub fn rejected(entity: &str, message: impl Into<String>) -> Self {
        DataError::Validation {
            entity: entity.to_string(),
            attribute: None,
            message: message.into(),
        }
    }

    pub fn invalid_input(entity: &str, message: impl Into<String>) -> Self {
        DataError::InvalidInput {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    pub fn data_access(entity: &str, operation: &'static str, source: StoreError) -> Self {
        DataError::DataAccess {
            entity: entity.to_string(),
            operation,
            source,
        }
    }

    /// True for failures raised before any store call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DataError::MissingAttribute { .. }
                | DataError::Validation { .. }
                | DataError::ReadOnlyViolation { .. }
                | DataError::MissingKeyAttribute { .. }
                | DataError::InvalidInput { .. }
        )
    }
}

/// Result type for entity layer operations.
pub type Result<T> = std::result::Result<T, DataError>;
