//! Store factory: builds the configured backend once at startup.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::mongo::MongoStore;
use super::postgres::PgStore;
use super::{MemoryStore, Store, StoreError, TimedStore};
use crate::config::{StoreBackend, StoreConfig};

/// Create the store selected by `config.backend`, wrapped in the timeout decorator.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
    let inner: Arc<dyn Store> = match config.backend {
        StoreBackend::Postgres => Arc::new(PgStore::connect(config).await?),
        StoreBackend::Mongodb => Arc::new(MongoStore::connect(config).await?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    info!(
        backend = inner.backend(),
        timeout_ms = config.operation_timeout_ms,
        "Record store ready"
    );
    Ok(Arc::new(TimedStore::new(inner, Duration::from_millis(config.operation_timeout_ms))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Environment};

    #[tokio::test]
    async fn test_memory_store_creation() {
        let mut config = AppConfig::defaults(Environment::Development).store;
        config.backend = StoreBackend::Memory;

        let store = create_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_postgres_requires_database_url() {
        let mut config = AppConfig::defaults(Environment::Development).store;
        config.database_url = None;

        let err = create_store(&config).await.err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
