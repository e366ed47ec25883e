mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use http_mapping::{data_error_to_status_code, store_error_to_status_code};
pub use traits::Store;
pub use types::{
    BatchGetOutcome, BatchWriteOutcome, ContinuationKey, Item, PrimaryKey, PutMode, QueryPage,
    QueryRequest, SortCondition, MAX_BATCH_GET, MAX_BATCH_WRITE,
};
