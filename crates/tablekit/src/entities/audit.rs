use std::ops::Deref;

use tablekit_core::attribute::{is_iso_date, is_non_empty_string};
use tablekit_core::{
    AttributeSpec, DataError, ReferenceKind, Record, Schema, SchemaBuilder, SchemaError, SortOrder,
    Value,
};

use crate::collection::{Collection, QueryOptions, QueryOutput};
use crate::model::Model;
use crate::registry::{Registry, RegistryError};

pub const ENTITY: &str = "Audit";

pub fn schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .add_attribute(
            "auditType",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute(
            "auditedAt",
            AttributeSpec::string().required().validate(is_iso_date),
        )
        .add_attribute("auditResult", AttributeSpec::map().required())
        .add_attribute("fullAuditRef", AttributeSpec::string())
        .add_attribute("isLive", AttributeSpec::boolean().default_value(false))
        .add_attribute("isError", AttributeSpec::boolean().default_value(false))
        .add_reference_with(
            ReferenceKind::BelongsTo,
            "Site",
            &["auditType", "auditedAt"],
            true,
        )
        .build()
}

/// Audit collection with per-site lookups.
#[derive(Debug, Clone)]
pub struct AuditCollection(Collection);

impl AuditCollection {
    pub fn from_registry(registry: &Registry) -> Result<Self, RegistryError> {
        registry.collection(ENTITY).map(Self)
    }

    fn site_keys(&self, site_id: &str, audit_type: &str) -> tablekit_core::Result<Record> {
        if site_id.trim().is_empty() || audit_type.trim().is_empty() {
            return Err(DataError::invalid_input(
                ENTITY,
                "Both siteId and auditType are required",
            ));
        }
        Ok(Record::from([
            ("siteId".to_string(), Value::from(site_id)),
            ("auditType".to_string(), Value::from(audit_type)),
        ]))
    }

    /// Audits of one type for a site, newest first unless `options` says otherwise.
    pub async fn all_by_site_id_and_audit_type(
        &self,
        site_id: &str,
        audit_type: &str,
        options: QueryOptions,
    ) -> tablekit_core::Result<QueryOutput> {
        let keys = self.site_keys(site_id, audit_type)?;
        self.0.all_by_index_keys(&keys, options).await
    }

    /// Most recent audit of one type for a site.
    pub async fn find_latest(&self, site_id: &str, audit_type: &str) -> tablekit_core::Result<Option<Model>> {
        let keys = self.site_keys(site_id, audit_type)?;
        self.0
            .find_by_index_keys(&keys, QueryOptions::new().order(SortOrder::Desc))
            .await
    }
}

impl Deref for AuditCollection {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry, sample_site};
    use serde_json::json;
    use tablekit_core::record_from_json;

    #[tokio::test]
    async fn test_latest_audit_by_type() {
        let registry = registry();
        let (site_id, _) = sample_site(&registry).await;
        let audits = AuditCollection::from_registry(&registry).unwrap();
        for (audit_type, audited_at) in [
            ("cwv", "2025-01-01T00:00:00.000Z"),
            ("cwv", "2025-03-01T00:00:00.000Z"),
            ("cwv", "2025-02-01T00:00:00.000Z"),
            ("404", "2025-04-01T00:00:00.000Z"),
        ] {
            audits
                .create(record_from_json(json!({
                    "siteId": site_id,
                    "auditType": audit_type,
                    "auditedAt": audited_at,
                    "auditResult": {"score": 0.9},
                })))
                .await
                .unwrap();
        }

        let latest = audits.find_latest(&site_id, "cwv").await.unwrap().unwrap();
        assert_eq!(latest.get_str("auditedAt"), Some("2025-03-01T00:00:00.000Z"));

        let cwv = audits
            .all_by_site_id_and_audit_type(&site_id, "cwv", QueryOptions::new().order(SortOrder::Asc))
            .await
            .unwrap();
        let dates: Vec<&str> = cwv.data().iter().filter_map(|a| a.get_str("auditedAt")).collect();
        assert_eq!(
            dates,
            [
                "2025-01-01T00:00:00.000Z",
                "2025-02-01T00:00:00.000Z",
                "2025-03-01T00:00:00.000Z"
            ]
        );
    }

    #[tokio::test]
    async fn test_site_lookup_requires_both_keys() {
        let registry = registry();
        let audits = AuditCollection::from_registry(&registry).unwrap();

        assert!(matches!(
            audits.find_latest("", "cwv").await,
            Err(DataError::InvalidInput { .. })
        ));
    }
}
