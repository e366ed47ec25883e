//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `tablekit_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use tablekit_core::storage::{PutMode, StoreError};

const THROUGHPUT_EXCEEDED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT_EXCEEDED: &str = "Request limit exceeded, please retry";
const INTERNAL_SERVER_ERROR: &str = "DynamoDB internal server error";
const TABLE_NOT_FOUND: &str = "Table not found";

fn query_failed(message: &str) -> StoreError {
    StoreError::QueryFailed(message.to_string())
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        GetItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        GetItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        GetItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => StoreError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(err: SdkError<QueryError, R>) -> StoreError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        QueryError::ProvisionedThroughputExceededException(_) => query_failed(THROUGHPUT_EXCEEDED),
        QueryError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        QueryError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => StoreError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
///
/// A failed condition means the key was taken on create and free on replace.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    mode: PutMode,
    key: impl Into<String>,
) -> StoreError {
    let key = key.into();
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => match mode {
            PutMode::Replace => StoreError::NotFound { key },
            PutMode::Create | PutMode::Upsert => StoreError::AlreadyExists { key },
        },
        PutItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        PutItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        PutItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            query_failed("Item collection size limit exceeded")
        }
        PutItemError::TransactionConflictException(_) => {
            query_failed("Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => StoreError::QueryFailed(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        DeleteItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        DeleteItemError::TransactionConflictException(_) => {
            query_failed("Transaction conflict, please retry")
        }
        DeleteItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => StoreError::QueryFailed(format!("DeleteItem failed: {:?}", err)),
    }
}

/// Map a BatchWriteItem SDK error to StoreError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        BatchWriteItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        BatchWriteItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        BatchWriteItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => StoreError::QueryFailed(format!("BatchWriteItem failed: {:?}", err)),
    }
}

/// Map a BatchGetItem SDK error to StoreError.
pub fn map_batch_get_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(_) => query_failed(TABLE_NOT_FOUND),
        BatchGetItemError::ProvisionedThroughputExceededException(_) => {
            query_failed(THROUGHPUT_EXCEEDED)
        }
        BatchGetItemError::RequestLimitExceeded(_) => query_failed(REQUEST_LIMIT_EXCEEDED),
        BatchGetItemError::InternalServerError(_) => query_failed(INTERNAL_SERVER_ERROR),
        err => StoreError::QueryFailed(format!("BatchGetItem failed: {:?}", err)),
    }
}
