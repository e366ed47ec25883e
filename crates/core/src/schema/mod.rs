//! Immutable schema descriptors.
//!
//! A [`Schema`] is produced once per entity type by [`SchemaBuilder::build`] and shared read-only by
//! every collection and model of that type.

mod builder;
mod error;
pub mod naming;

pub use builder::SchemaBuilder;
pub use error::SchemaError;

use std::collections::HashMap;

use crate::attribute::AttributeSpec;

/// Id of the table's own key.
pub const PRIMARY_INDEX: &str = "primary";
/// Id of the per-entity listing index.
pub const ALL_INDEX: &str = "all";

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Physical partition/sort field names of the table key.
pub const TABLE_PK: &str = "pk";
pub const TABLE_SK: &str = "sk";

/// Attribute naming the entity type on every stored item.
pub const ENTITY_TYPE_FIELD: &str = "entityType";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    All,
    BelongsTo,
    Other,
}

/// One access path: the table key or a global secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub id: String,
    pub kind: IndexKind,
    pub partition: Vec<String>,
    /// Static partition value used instead of attributes (the `all` index).
    pub partition_template: Option<String>,
    pub sort: Vec<String>,
    /// GSI name; `None` for the table key.
    pub physical_name: Option<String>,
    pub pk_field: String,
    pub sk_field: String,
    /// Items lacking an index attribute are left out of the index.
    pub sparse: bool,
}

impl IndexDef {
    /// All attributes the index composes, partition first.
    pub fn key_attributes(&self) -> impl Iterator<Item = &String> {
        self.partition.iter().chain(self.sort.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    BelongsTo,
    HasMany,
    HasOne,
}

/// A lazily resolved relationship to another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub target: String,
    pub sort_keys: Vec<String>,
    pub required: bool,
}

/// Accessor methods generated from the attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub attribute: String,
    pub getter: String,
    pub setter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Schema {
    entity_name: String,
    id_name: String,
    attributes: Vec<(String, AttributeSpec)>,
    positions: HashMap<String, usize>,
    primary: IndexDef,
    indexes: Vec<IndexDef>,
    references: Vec<Reference>,
    accessors: Vec<Accessor>,
}

impl Schema {
    pub fn builder(entity_name: &str) -> SchemaBuilder {
        SchemaBuilder::new(entity_name)
    }

    /// PascalCase entity name, e.g. `SiteEnrollment`.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Decapitalized name used by capabilities, e.g. `siteEnrollment`.
    pub fn model_name(&self) -> String {
        naming::decapitalize(&self.entity_name)
    }

    /// Name of the generated id attribute, e.g. `siteId`.
    pub fn id_name(&self) -> &str {
        &self.id_name
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeSpec)> {
        self.attributes
            .iter()
            .map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.positions.get(name).map(|&i| &self.attributes[i].1)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn primary_index(&self) -> &IndexDef {
        &self.primary
    }

    /// Whether the primary key is the generated id alone.
    pub fn is_single_id_keyed(&self) -> bool {
        self.primary.partition.len() == 1
            && self.primary.partition[0] == self.id_name
            && self.primary.sort.is_empty()
    }

    /// Secondary indexes in GSI slot order.
    pub fn secondary_indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    /// Looks up any index, including the primary one, by id.
    pub fn index(&self, id: &str) -> Option<&IndexDef> {
        if id == PRIMARY_INDEX {
            return Some(&self.primary);
        }
        self.indexes.iter().find(|index| index.id == id)
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn reference_to(&self, target: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.target == target)
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    pub fn accessor(&self, attribute: &str) -> Option<&Accessor> {
        self.accessors.iter().find(|a| a.attribute == attribute)
    }

    /// Number of GSI slots this entity occupies.
    pub fn gsi_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_primary_key_attribute(&self, name: &str) -> bool {
        self.primary.key_attributes().any(|attr| attr == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;

    fn site_schema() -> Schema {
        SchemaBuilder::new("Site")
            .add_attribute("baseURL", AttributeSpec::string().required())
            .add_attribute("name", AttributeSpec::string())
            .add_reference(ReferenceKind::BelongsTo, "Organization")
            .add_all_index(&["baseURL"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_exposes_generated_id_and_timestamps() {
        let schema = site_schema();
        assert_eq!(schema.id_name(), "siteId");
        assert!(schema.has_attribute(CREATED_AT));
        assert!(schema.has_attribute(UPDATED_AT));
        assert!(schema.is_single_id_keyed());
    }

    #[test]
    fn test_index_lookup_includes_primary() {
        let schema = site_schema();
        assert_eq!(schema.index(PRIMARY_INDEX).unwrap().kind, IndexKind::Primary);
        assert_eq!(schema.index(ALL_INDEX).unwrap().kind, IndexKind::All);
        assert_eq!(
            schema.index("byOrganizationId").unwrap().kind,
            IndexKind::BelongsTo
        );
        assert!(schema.index("byNothing").is_none());
    }

    #[test]
    fn test_accessors_skip_setters_for_read_only() {
        let schema = site_schema();
        let id = schema.accessor("siteId").unwrap();
        assert_eq!(id.getter, "getSiteId");
        assert_eq!(id.setter, None);

        let base_url = schema.accessor("baseURL").unwrap();
        assert_eq!(base_url.getter, "getBaseURL");
        assert_eq!(base_url.setter.as_deref(), Some("setBaseURL"));
    }

    #[test]
    fn test_model_name_is_decapitalized() {
        assert_eq!(site_schema().model_name(), "site");
    }
}
