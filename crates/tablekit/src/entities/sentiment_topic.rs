//! Sentiment topics tracked per site, keyed by `siteId` + `topicId`.

use std::ops::Deref;

use tablekit_core::attribute::{is_non_empty_string, is_uuid};
use tablekit_core::{
    AttributeSpec, DataError, Predicate, Record, Result, Schema, SchemaBuilder, SchemaError, Value,
};

use crate::collection::{Collection, QueryOptions, QueryOutput};
use crate::model::Model;
use crate::registry::{Registry, RegistryError};

pub const ENTITY: &str = "SentimentTopic";

const SUB_PROMPTS: &str = "subPrompts";

pub fn schema() -> std::result::Result<Schema, SchemaError> {
    SchemaBuilder::new(ENTITY)
        .with_primary_partition_keys(&["siteId"])
        .with_primary_sort_keys(&["topicId"])
        .add_attribute("siteId", AttributeSpec::string().required().validate(is_uuid))
        .add_attribute(
            "topicId",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute(
            "name",
            AttributeSpec::string().required().validate(is_non_empty_string),
        )
        .add_attribute("description", AttributeSpec::string())
        .add_attribute(
            SUB_PROMPTS,
            AttributeSpec::list()
                .default_value(Value::List(Vec::new()))
                .validate(|value| {
                    value
                        .as_list()
                        .is_some_and(|items| items.iter().all(|item| item.as_str().is_some()))
                }),
        )
        .add_attribute("audits", AttributeSpec::string_set())
        .add_attribute("enabled", AttributeSpec::boolean().required().default_value(true))
        .add_attribute("createdBy", AttributeSpec::string())
        .add_attribute("updatedBy", AttributeSpec::string())
        .build()
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DataError::invalid_input(ENTITY, message));
    }
    Ok(())
}

fn site_keys(site_id: &str) -> Record {
    Record::from([("siteId".to_string(), Value::from(site_id))])
}

/// Sentiment topic collection with per-site helpers.
#[derive(Debug, Clone)]
pub struct SentimentTopicCollection(Collection);

impl SentimentTopicCollection {
    pub fn from_registry(registry: &Registry) -> std::result::Result<Self, RegistryError> {
        registry.collection(ENTITY).map(Self)
    }

    /// Point read by the composite key.
    pub async fn find_by_id(&self, site_id: &str, topic_id: &str) -> Result<Option<Model>> {
        if site_id.trim().is_empty() || topic_id.trim().is_empty() {
            return Err(DataError::invalid_input(
                ENTITY,
                "Both siteId and topicId are required",
            ));
        }
        let mut keys = site_keys(site_id);
        keys.insert("topicId".to_string(), Value::from(topic_id));
        self.0.find_by_primary_key(&keys).await
    }

    pub async fn all_by_site_id(&self, site_id: &str, options: QueryOptions) -> Result<QueryOutput> {
        require(site_id, "SiteId is required")?;
        self.0.all_by_index_keys(&site_keys(site_id), options).await
    }

    /// One page of a site's topics plus the cursor of the next page.
    pub async fn all_by_site_id_paginated(
        &self,
        site_id: &str,
        options: QueryOptions,
    ) -> Result<QueryOutput> {
        self.all_by_site_id(site_id, options.return_cursor()).await
    }

    /// Enabled topics of a site, with a cursor. The `enabled` condition is combined with any
    /// filter already set on `options` using `AND`.
    pub async fn all_by_site_id_enabled(&self, site_id: &str, options: QueryOptions) -> Result<QueryOutput> {
        self.all_by_site_id(
            site_id,
            options
                .return_cursor()
                .filter(Predicate::eq("enabled", true)),
        )
        .await
    }

    /// Topics whose `audits` set contains `audit_type`.
    pub async fn all_by_site_id_and_audit_type(
        &self,
        site_id: &str,
        audit_type: &str,
        options: QueryOptions,
    ) -> Result<QueryOutput> {
        if site_id.trim().is_empty() || audit_type.trim().is_empty() {
            return Err(DataError::invalid_input(
                ENTITY,
                "Both siteId and auditType are required",
            ));
        }
        self.all_by_site_id(
            site_id,
            options
                .return_cursor()
                .filter(Predicate::contains("audits", audit_type)),
        )
        .await
    }

    /// Removes every topic of a site.
    pub async fn remove_for_site_id(&self, site_id: &str) -> Result<()> {
        let topics = self.all_by_site_id(site_id, QueryOptions::new()).await?;
        if topics.is_empty() {
            return Ok(());
        }
        let keys = topics
            .data()
            .iter()
            .map(Model::composite_keys)
            .collect::<Result<Vec<_>>>()?;
        self.0.remove_by_index_keys(&keys).await
    }
}

impl Deref for SentimentTopicCollection {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &self.0
    }
}

/// Sub-prompt editing for sentiment topic models. Changes are saved with [`Model::save`].
pub trait SubPrompts {
    fn sub_prompts(&self) -> Vec<String>;

    /// Appends a prompt; duplicates are kept.
    fn add_sub_prompt(&mut self, prompt: &str) -> Result<&mut Self>;

    /// Drops every occurrence of a prompt. Absent prompts leave the model untouched.
    fn remove_sub_prompt(&mut self, prompt: &str) -> Result<&mut Self>;
}

fn ensure_topic(model: &Model) -> Result<()> {
    if model.entity_name() != ENTITY {
        return Err(DataError::invalid_input(
            model.entity_name(),
            "sub-prompts exist on sentiment topics only",
        ));
    }
    Ok(())
}

impl SubPrompts for Model {
    fn sub_prompts(&self) -> Vec<String> {
        self.get_list(SUB_PROMPTS)
            .unwrap_or_default()
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    fn add_sub_prompt(&mut self, prompt: &str) -> Result<&mut Self> {
        ensure_topic(self)?;
        let mut prompts = self.get_list(SUB_PROMPTS).unwrap_or_default().to_vec();
        prompts.push(Value::from(prompt));
        self.set(SUB_PROMPTS, Value::List(prompts))
    }

    fn remove_sub_prompt(&mut self, prompt: &str) -> Result<&mut Self> {
        ensure_topic(self)?;
        let prompts = self.get_list(SUB_PROMPTS).unwrap_or_default();
        if !prompts.iter().any(|item| item.as_str() == Some(prompt)) {
            return Ok(self);
        }
        let kept: Vec<Value> = prompts
            .iter()
            .filter(|item| item.as_str() != Some(prompt))
            .cloned()
            .collect();
        self.set(SUB_PROMPTS, Value::List(kept))
    }
}
