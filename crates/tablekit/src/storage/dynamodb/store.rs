//! DynamoDB store implementation.
//!
//! Implements `tablekit_core::storage::Store` against one table using `aws-sdk-dynamodb`.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeValue, DeleteRequest, KeysAndAttributes, PutRequest, WriteRequest,
};
use aws_sdk_dynamodb::Client;

use tablekit_core::storage::{
    BatchGetOutcome, BatchWriteOutcome, Item, PrimaryKey, PutMode, QueryPage, QueryRequest, Result,
    SortCondition, Store, StoreError, MAX_BATCH_GET, MAX_BATCH_WRITE,
};

use super::conversions::{
    attributes_to_continuation, attributes_to_item, attributes_to_key, continuation_to_attributes,
    item_to_attributes, key_attributes, value_to_attribute,
};
use super::error::{
    map_batch_get_error, map_batch_write_error, map_delete_item_error, map_get_item_error,
    map_put_item_error, map_query_error,
};
use crate::config::Config;

/// DynamoDB-backed single-table store.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a new store from environment configuration.
    ///
    /// Uses the AWS SDK default credential chain. `AWS_ENDPOINT_URL` targets a local DynamoDB,
    /// `AWS_REGION` defaults to `us-east-1` and the table name comes from [`Config::from_env`].
    pub async fn from_env() -> Result<Self> {
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));
        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Ok(Self::new(
            Client::new(&sdk_config),
            Config::from_env().table_name,
        ))
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Builds the key condition and its placeholders for a query.
fn key_condition(
    request: &QueryRequest,
) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
    let mut names = HashMap::from([("#pk".to_string(), request.pk_field.clone())]);
    let mut values = HashMap::from([(
        ":pk".to_string(),
        AttributeValue::S(request.pk_value.clone()),
    )]);

    let sort = match &request.sort {
        None => None,
        Some(SortCondition::Eq(value)) => {
            values.insert(":sk".to_string(), AttributeValue::S(value.clone()));
            Some("#sk = :sk".to_string())
        }
        Some(SortCondition::BeginsWith(prefix)) => {
            values.insert(":sk".to_string(), AttributeValue::S(prefix.clone()));
            Some("begins_with(#sk, :sk)".to_string())
        }
        Some(SortCondition::Between(low, high)) => {
            values.insert(":sk_low".to_string(), AttributeValue::S(low.clone()));
            values.insert(":sk_high".to_string(), AttributeValue::S(high.clone()));
            Some("#sk BETWEEN :sk_low AND :sk_high".to_string())
        }
    };

    let expression = match sort {
        Some(sort) => {
            names.insert("#sk".to_string(), request.sk_field.clone());
            format!("#pk = :pk AND {sort}")
        }
        None => "#pk = :pk".to_string(),
    };

    (expression, names, values)
}

fn build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(err.to_string())
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(attributes_to_item).transpose()
    }

    async fn put_item(&self, item: Item, mode: PutMode) -> Result<()> {
        let key = PrimaryKey::of_item(&item)
            .map(|key| key.to_string())
            .unwrap_or_default();
        let condition = match mode {
            PutMode::Create => Some("attribute_not_exists(pk)".to_string()),
            PutMode::Replace => Some("attribute_exists(pk)".to_string()),
            PutMode::Upsert => None,
        };

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attributes(&item)))
            .set_condition_expression(condition)
            .send()
            .await
            .map_err(|e| map_put_item_error(e, mode, key))?;

        Ok(())
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let (key_expression, mut names, mut values) = key_condition(request);

        let filter_expression = request.filter.as_ref().map(|predicate| {
            let filter = predicate.to_filter_expression();
            names.extend(filter.names);
            values.extend(filter.values.iter().map(|(placeholder, value)| {
                (
                    placeholder.clone(),
                    value_to_attribute(value).unwrap_or(AttributeValue::Null(true)),
                )
            }));
            filter.expression
        });

        tracing::debug!(
            index = request.index_name.as_deref().unwrap_or("table"),
            key_condition = %key_expression,
            filter = filter_expression.as_deref().unwrap_or(""),
            "DynamoDB query"
        );

        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_index_name(request.index_name.clone())
            .key_condition_expression(key_expression)
            .set_filter_expression(filter_expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .set_limit(request.limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX)))
            .scan_index_forward(request.ascending)
            .set_exclusive_start_key(request.exclusive_start.as_ref().map(continuation_to_attributes))
            .send()
            .await
            .map_err(map_query_error)?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(attributes_to_item)
            .collect::<Result<Vec<_>>>()?;
        let last_evaluated = result
            .last_evaluated_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(attributes_to_continuation)
            .transpose()?;

        Ok(QueryPage {
            items,
            last_evaluated,
        })
    }

    async fn batch_write(&self, puts: Vec<Item>, deletes: Vec<PrimaryKey>) -> Result<BatchWriteOutcome> {
        if puts.len() + deletes.len() > MAX_BATCH_WRITE {
            return Err(StoreError::InvalidData(format!(
                "batch write exceeds {MAX_BATCH_WRITE} requests"
            )));
        }
        if puts.is_empty() && deletes.is_empty() {
            return Ok(BatchWriteOutcome::default());
        }

        let mut requests = Vec::with_capacity(puts.len() + deletes.len());
        for item in &puts {
            let put = PutRequest::builder()
                .set_item(Some(item_to_attributes(item)))
                .build()
                .map_err(build_error)?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }
        for key in &deletes {
            let delete = DeleteRequest::builder()
                .set_key(Some(key_attributes(key)))
                .build()
                .map_err(build_error)?;
            requests.push(WriteRequest::builder().delete_request(delete).build());
        }

        let result = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(map_batch_write_error)?;

        let mut outcome = BatchWriteOutcome::default();
        let unprocessed = result
            .unprocessed_items
            .and_then(|mut tables| tables.remove(&self.table_name))
            .unwrap_or_default();
        for request in &unprocessed {
            if let Some(put) = request.put_request() {
                outcome.unprocessed_puts.push(attributes_to_item(put.item())?);
            }
            if let Some(delete) = request.delete_request() {
                outcome.unprocessed_deletes.push(attributes_to_key(delete.key())?);
            }
        }

        Ok(outcome)
    }

    async fn batch_get(&self, keys: &[PrimaryKey]) -> Result<BatchGetOutcome> {
        if keys.len() > MAX_BATCH_GET {
            return Err(StoreError::InvalidData(format!(
                "batch get exceeds {MAX_BATCH_GET} keys"
            )));
        }
        if keys.is_empty() {
            return Ok(BatchGetOutcome::default());
        }

        let request = KeysAndAttributes::builder()
            .set_keys(Some(keys.iter().map(key_attributes).collect()))
            .build()
            .map_err(build_error)?;

        let result = self
            .client
            .batch_get_item()
            .request_items(&self.table_name, request)
            .send()
            .await
            .map_err(map_batch_get_error)?;

        let items = result
            .responses
            .and_then(|mut tables| tables.remove(&self.table_name))
            .unwrap_or_default()
            .iter()
            .map(attributes_to_item)
            .collect::<Result<Vec<_>>>()?;
        let unprocessed = result
            .unprocessed_keys
            .and_then(|mut tables| tables.remove(&self.table_name))
            .map(|pending| {
                pending
                    .keys()
                    .iter()
                    .map(attributes_to_key)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(BatchGetOutcome { items, unprocessed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablekit_core::Predicate;

    fn request(sort: Option<SortCondition>) -> QueryRequest {
        QueryRequest {
            index_name: Some("gsi2".to_string()),
            pk_field: "gsi2pk".to_string(),
            pk_value: "$audit#siteId_s1".to_string(),
            sk_field: "gsi2sk".to_string(),
            sort,
            filter: Some(Predicate::eq("auditType", "cwv")),
            limit: None,
            exclusive_start: None,
            ascending: false,
        }
    }

    #[test]
    fn test_key_condition_partition_only() {
        let (expression, names, values) = key_condition(&request(None));

        assert_eq!(expression, "#pk = :pk");
        assert_eq!(names.get("#pk").unwrap(), "gsi2pk");
        assert!(!names.contains_key("#sk"));
        assert_eq!(values.get(":pk").unwrap().as_s().unwrap(), "$audit#siteId_s1");
    }

    #[test]
    fn test_key_condition_begins_with() {
        let (expression, names, values) = key_condition(&request(Some(
            SortCondition::BeginsWith("$audit#auditType_cwv#".to_string()),
        )));

        assert_eq!(expression, "#pk = :pk AND begins_with(#sk, :sk)");
        assert_eq!(names.get("#sk").unwrap(), "gsi2sk");
        assert_eq!(values.get(":sk").unwrap().as_s().unwrap(), "$audit#auditType_cwv#");
    }

    #[test]
    fn test_key_condition_between() {
        let (expression, _, values) = key_condition(&request(Some(SortCondition::Between(
            "a".to_string(),
            "b".to_string(),
        ))));

        assert_eq!(expression, "#pk = :pk AND #sk BETWEEN :sk_low AND :sk_high");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_key_placeholders_do_not_collide_with_filter() {
        let (_, names, values) = key_condition(&request(Some(SortCondition::Eq("x".to_string()))));
        let filter = Predicate::eq("auditType", "cwv").to_filter_expression();

        assert!(filter.names.keys().all(|name| !names.contains_key(name)));
        assert!(filter.values.keys().all(|value| !values.contains_key(value)));
    }
}
