use tablekit_core::attribute::is_uuid;
use tablekit_core::{AttributeSpec, Schema, SchemaBuilder, SchemaError};

pub const ENTITY: &str = "SiteEnrollmentV2";

/// Enrollment keyed by entitlement, then site. Mirrored into the legacy `SiteEnrollment`.
pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .with_primary_partition_keys(&["entitlementId"])
        .with_primary_sort_keys(&["siteId"])
        .add_attribute(
            "entitlementId",
            AttributeSpec::string().required().validate(is_uuid),
        )
        .add_attribute("siteId", AttributeSpec::string().required().validate(is_uuid))
        .add_attribute("updatedBy", AttributeSpec::string())
        .add_index(&["siteId"], &["entitlementId"])
        .build()
}
