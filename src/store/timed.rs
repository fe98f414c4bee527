use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{Document, Store, StoreError};
use crate::filter::FilterData;
use crate::schema::Collection;

/// Bounds every store call with a deadline. Wraps whichever backend the
/// factory built, so the services never see an unbounded await.
pub struct TimedStore {
    inner: Arc<dyn Store>,
    timeout: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn Store>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, backend = self.inner.backend(), timeout_ms = self.timeout.as_millis() as u64, "store operation timed out");
                Err(StoreError::Timeout(operation))
            }
        }
    }
}

#[async_trait]
impl Store for TimedStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn find(&self, collection: Collection, query: &FilterData) -> Result<Vec<Document>, StoreError> {
        self.bounded("find", self.inner.find(collection, query)).await
    }

    async fn find_one(&self, collection: Collection, filter: &Value) -> Result<Option<Document>, StoreError> {
        self.bounded("find_one", self.inner.find_one(collection, filter)).await
    }

    async fn insert(&self, collection: Collection, record: Document) -> Result<i64, StoreError> {
        self.bounded("insert", self.inner.insert(collection, record)).await
    }

    async fn update(&self, collection: Collection, filter: &Value, patch: Document) -> Result<u64, StoreError> {
        self.bounded("update", self.inner.update(collection, filter, patch)).await
    }

    async fn delete(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError> {
        self.bounded("delete", self.inner.delete(collection, filter)).await
    }

    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError> {
        self.bounded("count", self.inner.count(collection, filter)).await
    }

    async fn alumni_with_pekerjaan(&self, alumni_filter: &Value, job_filter: &Value) -> Result<Vec<Document>, StoreError> {
        self.bounded("alumni_with_pekerjaan", self.inner.alumni_with_pekerjaan(alumni_filter, job_filter)).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.bounded("health_check", self.inner.health_check()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct StalledStore;

    #[async_trait]
    impl Store for StalledStore {
        fn backend(&self) -> &'static str { "stalled" }
        async fn find(&self, _: Collection, _: &FilterData) -> Result<Vec<Document>, StoreError> { std::future::pending().await }
        async fn find_one(&self, _: Collection, _: &Value) -> Result<Option<Document>, StoreError> { std::future::pending().await }
        async fn insert(&self, _: Collection, _: Document) -> Result<i64, StoreError> { std::future::pending().await }
        async fn update(&self, _: Collection, _: &Value, _: Document) -> Result<u64, StoreError> { std::future::pending().await }
        async fn delete(&self, _: Collection, _: &Value) -> Result<u64, StoreError> { std::future::pending().await }
        async fn count(&self, _: Collection, _: &Value) -> Result<u64, StoreError> { std::future::pending().await }
        async fn alumni_with_pekerjaan(&self, _: &Value, _: &Value) -> Result<Vec<Document>, StoreError> { std::future::pending().await }
        async fn health_check(&self) -> Result<(), StoreError> { std::future::pending().await }
    }

    #[tokio::test]
    async fn stalled_backend_times_out() {
        let store = TimedStore::new(Arc::new(StalledStore), Duration::from_millis(20));
        let err = store.count(Collection::Alumni, &json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout("count")));
    }

    #[tokio::test]
    async fn healthy_backend_passes_through() {
        let store = TimedStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        assert_eq!(store.count(Collection::Alumni, &json!({})).await.unwrap(), 0);
        assert_eq!(store.backend(), "memory");
    }
}
