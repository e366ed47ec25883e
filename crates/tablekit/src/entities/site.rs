use std::ops::Deref;

use tablekit_core::attribute::is_http_url;
use tablekit_core::{AttributeSpec, ReferenceKind, Record, Schema, SchemaBuilder, SchemaError, Value};

use crate::collection::{Collection, QueryOptions};
use crate::model::Model;
use crate::registry::{Registry, RegistryError};

pub const ENTITY: &str = "Site";

pub const DELIVERY_TYPES: [&str; 3] = ["aem_edge", "aem_cs", "other"];

pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .add_attribute(
            "baseURL",
            AttributeSpec::string().required().validate(is_http_url),
        )
        .add_attribute("name", AttributeSpec::string())
        .add_attribute(
            "deliveryType",
            AttributeSpec::one_of(DELIVERY_TYPES)
                .required()
                .default_value("other"),
        )
        .add_attribute("gitHubURL", AttributeSpec::string().validate(is_http_url))
        .add_attribute("isLive", AttributeSpec::boolean().required().default_value(false))
        .add_attribute("config", AttributeSpec::map())
        .add_reference(ReferenceKind::BelongsTo, "Organization")
        .add_reference(ReferenceKind::HasMany, "Audit")
        .add_reference(ReferenceKind::HasMany, "SiteEnrollment")
        .add_reference(ReferenceKind::HasMany, "SentimentTopic")
        .add_all_index(&["baseURL"])
        .build()
}

/// Site collection with lookups by URL.
#[derive(Debug, Clone)]
pub struct SiteCollection(Collection);

impl SiteCollection {
    pub fn from_registry(registry: &Registry) -> Result<Self, RegistryError> {
        registry.collection(ENTITY).map(Self)
    }

    /// The site registered for `base_url`, if any.
    pub async fn find_by_base_url(&self, base_url: &str) -> tablekit_core::Result<Option<Model>> {
        let keys = Record::from([("baseURL".to_string(), Value::from(base_url))]);
        self.0.find_by_index_keys(&keys, QueryOptions::new()).await
    }
}

impl Deref for SiteCollection {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry, sample_site};

    #[tokio::test]
    async fn test_find_by_base_url() {
        let registry = registry();
        let (site_id, _) = sample_site(&registry).await;
        let sites = SiteCollection::from_registry(&registry).unwrap();

        let found = sites
            .find_by_base_url("https://www.example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id(), Some(site_id.as_str()));
        assert_eq!(found.get_str("deliveryType"), Some("other"));
        assert_eq!(found.get_bool("isLive"), Some(false));
        assert!(sites
            .find_by_base_url("https://unknown.example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delivery_type_is_an_enum() {
        let registry = registry();
        let (_, organization_id) = sample_site(&registry).await;
        let sites = SiteCollection::from_registry(&registry).unwrap();

        let result = sites
            .create(Record::from([
                ("baseURL".to_string(), Value::from("https://other.example.com")),
                ("organizationId".to_string(), Value::from(organization_id)),
                ("deliveryType".to_string(), Value::from("ftp")),
            ]))
            .await;

        assert!(result.unwrap_err().is_validation());
    }
}
