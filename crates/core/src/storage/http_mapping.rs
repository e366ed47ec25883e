//! Pure functions for mapping entity layer errors to HTTP status codes.
//!
//! API clients built on the layer surface these codes; the mapping has no side effects.

use super::StoreError;
use crate::error::DataError;

/// Maps a [`StoreError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `QueryFailed` -> 500 (Internal Server Error)
/// - `Serialization` -> 500 (Internal Server Error)
/// - `InvalidData` -> 400 (Bad Request)
///
/// # Examples
///
/// ```
/// use tablekit_core::storage::{store_error_to_status_code, StoreError};
///
/// let error = StoreError::NotFound { key: "abc".to_string() };
/// assert_eq!(store_error_to_status_code(&error), 404);
/// ```
pub fn store_error_to_status_code(error: &StoreError) -> u16 {
    match error {
        StoreError::NotFound { .. } => 404,
        StoreError::AlreadyExists { .. } => 409,
        StoreError::ConnectionFailed(_) => 503,
        StoreError::QueryFailed(_) => 500,
        StoreError::Serialization(_) => 500,
        StoreError::InvalidData(_) => 400,
    }
}

/// Maps a [`DataError`] to an HTTP status code. Store failures defer to
/// [`store_error_to_status_code`]; validation failures are 400.
pub fn data_error_to_status_code(error: &DataError) -> u16 {
    match error {
        DataError::NotFound { .. } => 404,
        DataError::DataAccess { source, .. } => store_error_to_status_code(source),
        DataError::MissingAttribute { .. }
        | DataError::Validation { .. }
        | DataError::ReadOnlyViolation { .. }
        | DataError::MissingKeyAttribute { .. }
        | DataError::InvalidInput { .. } => 400,
    }
}
