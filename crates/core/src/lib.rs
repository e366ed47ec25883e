//! Functional core of the tablekit entity layer.
//!
//! Everything here is pure: schemas and their builder, attribute validation, key composition,
//! predicates, cursors, sorting, capability checks and record/item mapping. The [`storage::Store`]
//! trait is the single seam to the imperative shell that talks to an actual store.

pub mod attribute;
pub mod capability;
pub mod cursor;
pub mod dto;
pub mod error;
pub mod keys;
pub mod predicate;
pub mod schema;
pub mod sorting;
pub mod storage;
pub mod validate;
pub mod value;

pub use attribute::{AttributeSpec, AttributeType};
pub use error::{DataError, Result};
pub use predicate::Predicate;
pub use schema::{ReferenceKind, Schema, SchemaBuilder, SchemaError};
pub use sorting::SortOrder;
pub use value::{record_from_json, record_to_json, string_set, Record, Value};
