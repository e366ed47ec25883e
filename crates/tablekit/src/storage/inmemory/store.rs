//! In-memory store implementation.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tablekit_core::schema::{TABLE_PK, TABLE_SK};
use tablekit_core::storage::{
    BatchGetOutcome, BatchWriteOutcome, ContinuationKey, Item, PrimaryKey, PutMode, QueryPage,
    QueryRequest, Result, Store, StoreError, MAX_BATCH_GET, MAX_BATCH_WRITE,
};
use tablekit_core::Value;

/// In-memory single-table store for testing.
///
/// Items live in a `BTreeMap` wrapped in `Arc<RwLock<_>>`. Queries honor key conditions, filters,
/// ordering, limits and continuation keys the way the DynamoDB backend does. Data is lost when the
/// store is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    items: Arc<RwLock<BTreeMap<PrimaryKey, Item>>>,
}

/// Position of an item within an index: sort value, then table key.
type Position = (String, String, String);

fn field<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.get(name).and_then(Value::as_str)
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn contains(&self, key: &PrimaryKey) -> bool {
        self.items.read().await.contains_key(key)
    }

    fn key_of(item: &Item) -> Result<PrimaryKey> {
        PrimaryKey::of_item(item).ok_or_else(|| {
            StoreError::InvalidData(format!("item is missing {TABLE_PK}/{TABLE_SK}"))
        })
    }

    fn start_position(request: &QueryRequest, start: &ContinuationKey) -> Result<Position> {
        let get = |name: &str| {
            start.get(name).cloned().ok_or_else(|| {
                StoreError::QueryFailed(format!("continuation key is missing {name}"))
            })
        };
        Ok((get(&request.sk_field)?, get(TABLE_PK)?, get(TABLE_SK)?))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn put_item(&self, item: Item, mode: PutMode) -> Result<()> {
        let key = Self::key_of(&item)?;
        let mut items = self.items.write().await;
        match mode {
            PutMode::Create if items.contains_key(&key) => {
                return Err(StoreError::AlreadyExists {
                    key: key.to_string(),
                });
            }
            PutMode::Replace if !items.contains_key(&key) => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                });
            }
            _ => {}
        }
        items.insert(key, item);
        Ok(())
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<()> {
        let mut items = self.items.write().await;
        items.remove(key);
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let items = self.items.read().await;

        let mut matched: Vec<(Position, &Item)> = items
            .iter()
            .filter(|(_, item)| field(item, &request.pk_field) == Some(request.pk_value.as_str()))
            .filter_map(|(key, item)| {
                let sort = field(item, &request.sk_field)?;
                let in_range = request.sort.as_ref().is_none_or(|cond| cond.matches(sort));
                in_range.then(|| ((sort.to_string(), key.pk.clone(), key.sk.clone()), item))
            })
            .collect();

        matched.sort_by(|(a, _), (b, _)| a.cmp(b));
        if !request.ascending {
            matched.reverse();
        }

        if let Some(start) = &request.exclusive_start {
            let start = Self::start_position(request, start)?;
            let wanted = if request.ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            matched.retain(|(position, _)| position.cmp(&start) == wanted);
        }

        let evaluated = request.limit.unwrap_or(usize::MAX).min(matched.len());
        let last_evaluated = if evaluated < matched.len() && evaluated > 0 {
            let ((sort, pk, sk), item) = &matched[evaluated - 1];
            let mut key = ContinuationKey::from([
                (TABLE_PK.to_string(), pk.clone()),
                (TABLE_SK.to_string(), sk.clone()),
                (request.sk_field.clone(), sort.clone()),
            ]);
            if let Some(partition) = field(item, &request.pk_field) {
                key.insert(request.pk_field.clone(), partition.to_string());
            }
            Some(key)
        } else {
            None
        };

        let items = matched
            .into_iter()
            .take(evaluated)
            .map(|(_, item)| item)
            .filter(|item| request.filter.as_ref().is_none_or(|f| f.matches(item)))
            .cloned()
            .collect();

        Ok(QueryPage {
            items,
            last_evaluated,
        })
    }

    async fn batch_write(
        &self,
        puts: Vec<Item>,
        deletes: Vec<PrimaryKey>,
    ) -> Result<BatchWriteOutcome> {
        if puts.len() + deletes.len() > MAX_BATCH_WRITE {
            return Err(StoreError::InvalidData(format!(
                "batch write exceeds {MAX_BATCH_WRITE} requests"
            )));
        }

        let keyed: Vec<(PrimaryKey, Item)> = puts
            .into_iter()
            .map(|item| Self::key_of(&item).map(|key| (key, item)))
            .collect::<Result<_>>()?;

        let mut items = self.items.write().await;
        for (key, item) in keyed {
            items.insert(key, item);
        }
        for key in &deletes {
            items.remove(key);
        }
        Ok(BatchWriteOutcome::default())
    }

    async fn batch_get(&self, keys: &[PrimaryKey]) -> Result<BatchGetOutcome> {
        if keys.len() > MAX_BATCH_GET {
            return Err(StoreError::InvalidData(format!(
                "batch get exceeds {MAX_BATCH_GET} keys"
            )));
        }
        let items = self.items.read().await;
        Ok(BatchGetOutcome {
            items: keys.iter().filter_map(|key| items.get(key).cloned()).collect(),
            unprocessed: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablekit_core::storage::SortCondition;
    use tablekit_core::Predicate;

    fn item(pk: &str, sk: &str, gsi_sk: &str, enabled: bool) -> Item {
        Item::from([
            ("pk".to_string(), Value::from(pk)),
            ("sk".to_string(), Value::from(sk)),
            ("gsi1pk".to_string(), Value::from("ALL_TOPIC")),
            ("gsi1sk".to_string(), Value::from(gsi_sk)),
            ("enabled".to_string(), Value::Bool(enabled)),
        ])
    }

    fn all_request() -> QueryRequest {
        QueryRequest {
            index_name: Some("gsi1".to_string()),
            pk_field: "gsi1pk".to_string(),
            pk_value: "ALL_TOPIC".to_string(),
            sk_field: "gsi1sk".to_string(),
            sort: None,
            filter: None,
            limit: None,
            exclusive_start: None,
            ascending: true,
        }
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (i, enabled) in [true, false, true, true, false].into_iter().enumerate() {
            store
                .put_item(
                    item(&format!("p{i}"), "s", &format!("t{i}"), enabled),
                    PutMode::Create,
                )
                .await
                .unwrap();
        }
        store
    }

    fn pks(page: &QueryPage) -> Vec<String> {
        page.items
            .iter()
            .map(|i| field(i, "pk").unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryStore::new();
        store
            .put_item(item("p", "s", "t", true), PutMode::Create)
            .await
            .unwrap();

        let found = store.get_item(&PrimaryKey::new("p", "s")).await.unwrap();
        assert_eq!(found, Some(item("p", "s", "t", true)));
        assert!(store
            .get_item(&PrimaryKey::new("p", "x"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_put_modes() {
        let store = InMemoryStore::new();
        let result = store
            .put_item(item("p", "s", "t", true), PutMode::Replace)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        store
            .put_item(item("p", "s", "t", true), PutMode::Create)
            .await
            .unwrap();
        let again = store
            .put_item(item("p", "s", "t", true), PutMode::Create)
            .await;
        assert!(matches!(again, Err(StoreError::AlreadyExists { .. })));

        store
            .put_item(item("p", "s", "t", false), PutMode::Upsert)
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_without_key_is_invalid() {
        let store = InMemoryStore::new();
        let result = store.put_item(Item::new(), PutMode::Upsert).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = seeded().await;
        store.delete_item(&PrimaryKey::new("p0", "s")).await.unwrap();
        store.delete_item(&PrimaryKey::new("p0", "s")).await.unwrap();
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_query_orders_by_sort_field() {
        let store = seeded().await;
        let page = store.query(&all_request()).await.unwrap();
        assert_eq!(pks(&page), vec!["p0", "p1", "p2", "p3", "p4"]);
        assert!(page.last_evaluated.is_none());

        let mut descending = all_request();
        descending.ascending = false;
        let page = store.query(&descending).await.unwrap();
        assert_eq!(pks(&page), vec!["p4", "p3", "p2", "p1", "p0"]);
    }

    #[tokio::test]
    async fn test_query_applies_sort_condition_and_filter() {
        let store = seeded().await;
        let mut request = all_request();
        request.sort = Some(SortCondition::Between("t1".to_string(), "t3".to_string()));
        request.filter = Some(Predicate::eq("enabled", true));

        let page = store.query(&request).await.unwrap();
        assert_eq!(pks(&page), vec!["p2", "p3"]);
    }

    #[tokio::test]
    async fn test_query_pages_follow_continuation_keys() {
        let store = seeded().await;
        for ascending in [true, false] {
            let mut request = all_request();
            request.limit = Some(2);
            request.ascending = ascending;

            let mut seen = Vec::new();
            loop {
                let page = store.query(&request).await.unwrap();
                seen.extend(pks(&page));
                match page.last_evaluated {
                    Some(key) => request.exclusive_start = Some(key),
                    None => break,
                }
            }

            let mut expected = vec!["p0", "p1", "p2", "p3", "p4"];
            if !ascending {
                expected.reverse();
            }
            assert_eq!(seen, expected);
        }
    }

    #[tokio::test]
    async fn test_limit_counts_items_before_filter() {
        let store = seeded().await;
        let mut request = all_request();
        request.limit = Some(2);
        request.filter = Some(Predicate::eq("enabled", false));

        let page = store.query(&request).await.unwrap();
        assert_eq!(pks(&page), vec!["p1"]);
        assert!(page.last_evaluated.is_some());
    }

    #[tokio::test]
    async fn test_batch_write_and_get() {
        let store = seeded().await;
        let outcome = store
            .batch_write(
                vec![item("p9", "s", "t9", true)],
                vec![PrimaryKey::new("p0", "s")],
            )
            .await
            .unwrap();
        assert_eq!(outcome, BatchWriteOutcome::default());

        let fetched = store
            .batch_get(&[PrimaryKey::new("p9", "s"), PrimaryKey::new("p0", "s")])
            .await
            .unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert!(fetched.unprocessed.is_empty());
    }

    #[tokio::test]
    async fn test_batch_write_rejects_oversized_batches() {
        let store = InMemoryStore::new();
        let puts = (0..26)
            .map(|i| item(&format!("p{i}"), "s", "t", true))
            .collect();
        let result = store.batch_write(puts, Vec::new()).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert!(store.is_empty().await);
    }
}
