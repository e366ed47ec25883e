//! Opaque pagination cursors.
//!
//! A cursor is the store's continuation key serialized as JSON and encoded as URL-safe base64.
//! Callers never look inside it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::storage::ContinuationKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("Cursor is not valid base64: {0}")]
    Encoding(String),
    #[error("Cursor does not contain a continuation key: {0}")]
    Payload(String),
}

pub fn encode(key: &ContinuationKey) -> String {
    // A map of strings always serializes.
    let json = serde_json::to_vec(key).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode(cursor: &str) -> Result<ContinuationKey, CursorError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.trim())
        .map_err(|e| CursorError::Encoding(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| CursorError::Payload(e.to_string()))
}

/// Encodes an optional continuation key; `None` means no more pages.
pub fn encode_optional(key: Option<&ContinuationKey>) -> Option<String> {
    key.map(encode)
}
