use async_trait::async_trait;

use super::{
    BatchGetOutcome, BatchWriteOutcome, Item, PrimaryKey, PutMode, QueryPage, QueryRequest, Result,
};

/// The single-table key-value store the entity layer runs on.
///
/// Implementations only resolve keys and evaluate the conditions they are given; they know nothing
/// about schemas.
#[async_trait]
pub trait Store: Send + Sync {
    /// Gets one item by its table key.
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>>;

    /// Writes one item under the existence condition of `mode`.
    async fn put_item(&self, item: Item, mode: PutMode) -> Result<()>;

    /// Deletes one item. Deleting an absent key succeeds.
    async fn delete_item(&self, key: &PrimaryKey) -> Result<()>;

    /// Returns one page of a partition query.
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage>;

    /// Writes up to [`super::MAX_BATCH_WRITE`] puts and deletes, reporting what was not applied.
    async fn batch_write(&self, puts: Vec<Item>, deletes: Vec<PrimaryKey>)
        -> Result<BatchWriteOutcome>;

    /// Gets up to [`super::MAX_BATCH_GET`] items, reporting keys not processed.
    async fn batch_get(&self, keys: &[PrimaryKey]) -> Result<BatchGetOutcome>;
}
