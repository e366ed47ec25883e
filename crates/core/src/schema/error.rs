use thiserror::Error;

/// Schema misconfiguration detected by [`super::SchemaBuilder::build`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Entity name must be a non-empty alphanumeric identifier: {0:?}")]
    InvalidEntityName(String),

    #[error("{entity}: duplicate attribute {attribute}")]
    DuplicateAttribute { entity: String, attribute: String },

    #[error("{entity}: primary key has no partition attributes")]
    EmptyPrimaryKey { entity: String },

    #[error("{entity}: index {index} has no partition attributes")]
    EmptyIndexPartition { entity: String, index: String },

    #[error("{entity}: index {index} references undeclared attribute {attribute}")]
    UnknownKeyAttribute {
        entity: String,
        index: String,
        attribute: String,
    },

    #[error("{entity}: key attribute {attribute} of index {index} must be required")]
    KeyAttributeNotRequired {
        entity: String,
        index: String,
        attribute: String,
    },

    #[error("{entity}: duplicate index {index}")]
    DuplicateIndex { entity: String, index: String },

    #[error("{entity}: index name {index} is reserved")]
    ReservedIndexName { entity: String, index: String },

    #[error("{entity}: invalid reference target {target:?}")]
    InvalidReference { entity: String, target: String },
}
