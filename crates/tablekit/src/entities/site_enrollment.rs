use tablekit_core::{AttributeSpec, ReferenceKind, Schema, SchemaBuilder, SchemaError};

pub const ENTITY: &str = "SiteEnrollment";

pub const STATUSES: [&str; 2] = ["ACTIVE", "SUSPENDED"];

/// Legacy enrollment record; kept in sync from [`super::site_enrollment_v2`].
pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .add_attribute(
            "status",
            AttributeSpec::one_of(STATUSES).required().default_value("ACTIVE"),
        )
        .add_attribute("updatedBy", AttributeSpec::string())
        .add_reference(ReferenceKind::BelongsTo, "Site")
        .add_reference(ReferenceKind::BelongsTo, "Entitlement")
        .build()
}
