//! AWS SDK client setup (Imperative Shell).

use super::error::{DynamodbError, Result};
use super::planning::{GsiState, GsiStatus, TableState, TableStatus};
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::types::{self as ddb, KeyType, TableDescription};
use aws_sdk_dynamodb::Client;

/// Where the deploy command points: an explicit endpoint (DynamoDB Local) or a region.
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub endpoint_url: Option<String>,
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }
}

impl AwsConfig {
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({url})"),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

pub async fn create_client(config: &AwsConfig) -> Result<Client> {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    Ok(Client::new(&loader.load().await))
}

fn table_status(status: Option<&ddb::TableStatus>) -> TableStatus {
    match status {
        Some(ddb::TableStatus::Creating) => TableStatus::Creating,
        Some(ddb::TableStatus::Updating) => TableStatus::Updating,
        Some(ddb::TableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Active,
    }
}

fn gsi_status(status: Option<&ddb::IndexStatus>) -> GsiStatus {
    match status {
        Some(ddb::IndexStatus::Creating) => GsiStatus::Creating,
        Some(ddb::IndexStatus::Updating) => GsiStatus::Updating,
        Some(ddb::IndexStatus::Deleting) => GsiStatus::Deleting,
        _ => GsiStatus::Active,
    }
}

fn key_attribute(table: &TableDescription, key_type: KeyType) -> Option<String> {
    table
        .key_schema()
        .iter()
        .find(|key| *key.key_type() == key_type)
        .map(|key| key.attribute_name().to_string())
}

fn table_state(table: &TableDescription) -> TableState {
    TableState {
        status: table_status(table.table_status()),
        partition_key: key_attribute(table, KeyType::Hash),
        sort_key: key_attribute(table, KeyType::Range),
        gsis: table
            .global_secondary_indexes()
            .iter()
            .map(|gsi| GsiState {
                name: gsi.index_name().unwrap_or_default().to_string(),
                status: gsi_status(gsi.index_status()),
            })
            .collect(),
    }
}

/// Fetches current table state, returns None if table doesn't exist.
pub async fn get_table_state(client: &Client, table_name: &str) -> Result<Option<TableState>> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(response) => response
            .table()
            .map(|table| Some(table_state(table)))
            .ok_or_else(|| {
                DynamodbError::AwsSdk(format!("DescribeTable returned no table for '{table_name}'"))
            }),
        Err(SdkError::ServiceError(err))
            if matches!(err.err(), DescribeTableError::ResourceNotFoundException(_)) =>
        {
            Ok(None)
        }
        Err(err) => Err(DynamodbError::AwsSdk(err.to_string())),
    }
}
