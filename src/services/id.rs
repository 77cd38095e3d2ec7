use crate::{
    error::{AppError, Result},
    services::Database,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// 顺序整数ID分配器
///
/// 每个序列一个计数器文档, 用单文档原子自增推进,
/// 与边存储解耦, 并发调用不会重复发号。
#[derive(Clone)]
pub struct IdAllocator {
    db: Arc<Database>,
}

impl IdAllocator {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn next_id(&self, sequence: &str) -> Result<i64> {
        debug!("Allocating next id for sequence {}", sequence);

        let mut response = self
            .db
            .query_with_params(
                r#"
                UPDATE type::thing('counter', $sequence)
                SET value = (value ?? 0) + 1
                RETURN AFTER
                "#,
                json!({ "sequence": sequence }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;

        rows.first()
            .and_then(|row| row.get("value"))
            .and_then(|value| value.as_i64())
            .ok_or_else(|| AppError::Internal("Counter update returned no value".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn test_allocator() -> IdAllocator {
        let config = Config::default();
        let db = Arc::new(Database::new(&config).await.expect("in-memory database"));
        db.query("DEFINE TABLE counter SCHEMAFULL; DEFINE FIELD value ON counter TYPE int;")
            .await
            .expect("counter schema")
            .check()
            .expect("counter schema");
        IdAllocator::new(db).await.expect("id allocator")
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let allocator = test_allocator().await;

        assert_eq!(allocator.next_id("user").await.unwrap(), 1);
        assert_eq!(allocator.next_id("user").await.unwrap(), 2);
        assert_eq!(allocator.next_id("user").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn sequences_are_independent() {
        let allocator = test_allocator().await;

        assert_eq!(allocator.next_id("user").await.unwrap(), 1);
        assert_eq!(allocator.next_id("session").await.unwrap(), 1);
        assert_eq!(allocator.next_id("user").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_allocations_never_collide() {
        let allocator = test_allocator().await;

        let (a, b, c) = tokio::join!(
            allocator.next_id("user"),
            allocator.next_id("user"),
            allocator.next_id("user")
        );
        let mut ids = vec![a.unwrap(), b.unwrap(), c.unwrap()];
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
