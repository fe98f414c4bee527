//! Record Store Adapter: one capability interface over PostgreSQL, MongoDB
//! and an in-memory map, all speaking the JSON filter vocabulary of
//! [`crate::filter`].
//!
//! Lifecycle predicates are expressed as `{"deleted_at": {"$exists": bool}}`
//! and every backend normalizes them: `IS [NOT] NULL` in SQL, absent-or-null
//! in documents.

pub mod factory;
pub mod memory;
pub mod mongo;
pub mod postgres;
pub mod timed;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::{FilterData, FilterError};
use crate::schema::Collection;

pub use factory::create_store;
pub use memory::MemoryStore;
pub use timed::TimedStore;

/// One record as a JSON object keyed by column name.
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store operation '{0}' timed out")]
    Timeout(&'static str),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and `/health`
    fn backend(&self) -> &'static str;

    async fn find(&self, collection: Collection, query: &FilterData) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: Collection, filter: &Value) -> Result<Option<Document>, StoreError>;

    /// Insert a record without `id`; returns the assigned id.
    async fn insert(&self, collection: Collection, record: Document) -> Result<i64, StoreError>;

    /// Apply `patch` to every match. A `null` patch value clears the field.
    async fn update(&self, collection: Collection, filter: &Value, patch: Document) -> Result<u64, StoreError>;

    async fn delete(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError>;

    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError>;

    /// Alumni matching `alumni_filter`, ordered by id, each with a `pekerjaan`
    /// array of its jobs matching `job_filter` (newest start date first, empty
    /// when none match).
    async fn alumni_with_pekerjaan(&self, alumni_filter: &Value, job_filter: &Value) -> Result<Vec<Document>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Combine filters with `$and`, dropping `null` parts.
pub fn and_filters(parts: impl IntoIterator<Item = Value>) -> Value {
    let parts: Vec<Value> = parts.into_iter().filter(|p| !p.is_null()).collect();
    match parts.len() {
        0 => Value::Object(Map::new()),
        1 => parts.into_iter().next().unwrap_or(Value::Null),
        _ => serde_json::json!({ "$and": parts }),
    }
}
