use tablekit_core::attribute::is_non_empty_string;
use tablekit_core::{AttributeSpec, ReferenceKind, Schema, SchemaBuilder, SchemaError};

pub const ENTITY: &str = "Organization";

pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .add_attribute(
            "name",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute("imsOrgId", AttributeSpec::string())
        .add_attribute("config", AttributeSpec::map())
        .add_attribute("fulfillableItems", AttributeSpec::any())
        .add_reference(ReferenceKind::HasMany, "Site")
        .add_reference(ReferenceKind::HasMany, "Entitlement")
        .add_all_index(&["name"])
        .build()
}
