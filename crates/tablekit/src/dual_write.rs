//! Best-effort mirroring of `SiteEnrollmentV2` into the legacy `SiteEnrollment` entity.
//!
//! The primary write always happens first and is never rolled back. Shadow failures are logged
//! and swallowed, so "primary written, shadow missing" is a reachable state that only shows up in
//! the logs.

use async_trait::async_trait;

use tablekit_core::{Predicate, Record, Value};

use crate::collection::{Collection, CollectionExtension, QueryOptions};
use crate::entities::site_enrollment;
use crate::model::Model;

/// Attributes copied from the primary record to the shadow record.
const MIRRORED: [&str; 3] = ["siteId", "entitlementId", "updatedBy"];

/// Extension keeping legacy enrollment records in step with `SiteEnrollmentV2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentShadow;

impl EnrollmentShadow {
    fn shadow(collection: &Collection) -> Option<Collection> {
        match collection.registry().collection(site_enrollment::ENTITY) {
            Ok(shadow) => Some(shadow),
            Err(err) => {
                tracing::error!(error = %err, "Shadow collection is unavailable");
                None
            }
        }
    }

    async fn remove_shadow(shadow: &Collection, site_id: &str, entitlement_id: &str) {
        let keys = Record::from([("siteId".to_string(), Value::from(site_id))]);
        let options = QueryOptions::new().filter(Predicate::eq("entitlementId", entitlement_id));
        let matches = match shadow.all_by_index_keys(&keys, options).await {
            Ok(found) => found.into_data(),
            Err(err) => {
                tracing::error!(
                    site_id,
                    entitlement_id,
                    error = %err,
                    "Failed to look up shadow enrollment"
                );
                return;
            }
        };

        let ids: Vec<String> = matches
            .iter()
            .filter_map(|model| model.id().map(str::to_string))
            .collect();
        if ids.is_empty() {
            tracing::warn!(site_id, entitlement_id, "No shadow enrollment to remove");
            return;
        }

        if let Err(err) = shadow.remove_by_ids(&ids).await {
            tracing::error!(
                site_id,
                entitlement_id,
                error = %err,
                "Failed to remove shadow enrollment"
            );
        }
    }
}

#[async_trait]
impl CollectionExtension for EnrollmentShadow {
    fn dependencies(&self) -> &[&'static str] {
        &[site_enrollment::ENTITY]
    }

    async fn after_create(&self, collection: &Collection, created: &Model) {
        let Some(shadow) = Self::shadow(collection) else {
            return;
        };
        let record: Record = MIRRORED
            .iter()
            .filter_map(|&name| created.get(name).map(|value| (name.to_string(), value.clone())))
            .collect();

        match shadow.create(record).await {
            Ok(mirrored) => tracing::debug!(
                primary = ?created.composite_keys().ok(),
                shadow_id = ?mirrored.id(),
                "Mirrored enrollment"
            ),
            Err(err) => tracing::error!(
                site_id = ?created.get_str("siteId"),
                entitlement_id = ?created.get_str("entitlementId"),
                error = %err,
                "Failed to mirror enrollment"
            ),
        }
    }

    async fn after_remove(&self, collection: &Collection, keys: &Record) {
        let site_id = keys.get("siteId").and_then(Value::as_str);
        let entitlement_id = keys.get("entitlementId").and_then(Value::as_str);
        let (Some(site_id), Some(entitlement_id)) = (site_id, entitlement_id) else {
            tracing::warn!(?keys, "Removed enrollment key lacks siteId or entitlementId");
            return;
        };
        let Some(shadow) = Self::shadow(collection) else {
            return;
        };
        Self::remove_shadow(&shadow, site_id, entitlement_id).await;
    }
}
