use tablekit_core::{AttributeSpec, ReferenceKind, Schema, SchemaBuilder, SchemaError};

pub const ENTITY: &str = "Entitlement";

pub const PRODUCT_CODES: [&str; 2] = ["ASO", "LLMO"];
pub const TIERS: [&str; 3] = ["FREE_TRIAL", "PAID", "PRE_ONBOARD"];

pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .add_attribute("productCode", AttributeSpec::one_of(PRODUCT_CODES).required())
        .add_attribute("tier", AttributeSpec::one_of(TIERS).required())
        .add_attribute("quotas", AttributeSpec::map())
        .add_reference_with(
            ReferenceKind::BelongsTo,
            "Organization",
            &["productCode"],
            true,
        )
        .add_reference(ReferenceKind::HasMany, "SiteEnrollment")
        .build()
}
