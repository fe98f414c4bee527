//! Soft-delete lifecycle engine
//!
//! `Active -> Trashed` (soft delete), `Trashed -> Active` (restore) and
//! `Trashed -> Purged` (hard delete), written once over the [`Store`] trait.
//! Every mutation is a point lookup, an ownership decision, then one filtered
//! write whose filter repeats id, state and owner scope; zero affected rows
//! means NotFound.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{ServiceError, ServiceResult};
use super::policy::{authorize, Action, Decision};
use crate::auth::Identity;
use crate::config::DenialPolicy;
use crate::filter::FilterData;
use crate::schema::Collection;
use crate::store::{and_filters, Document, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Active,
    Trashed,
}

impl RecordState {
    /// Backend-neutral lifecycle predicate
    pub fn predicate(&self) -> Value {
        match self {
            RecordState::Active => json!({ "deleted_at": { "$exists": false } }),
            RecordState::Trashed => json!({ "deleted_at": { "$exists": true } }),
        }
    }
}

/// Current instant in the wire format used for audit columns.
pub fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// One page (or all) of records plus the total matching count.
#[derive(Debug, Clone)]
pub struct Listing {
    pub rows: Vec<Document>,
    pub total: u64,
}

#[derive(Clone)]
pub struct Lifecycle {
    store: Arc<dyn Store>,
    collection: Collection,
    denial: DenialPolicy,
    label: &'static str,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn Store>, collection: Collection, denial: DenialPolicy, label: &'static str) -> Self {
        Self { store, collection, denial, label }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn not_found(&self) -> ServiceError {
        ServiceError::not_found(format!("{} not found", self.label))
    }

    /// Ownership decision for one record, with denials reported per the configured policy.
    fn decide(&self, identity: &Identity, action: Action, owner: Option<i64>) -> ServiceResult<Decision> {
        match authorize(identity, action, owner) {
            Ok(decision) => Ok(decision),
            Err(ServiceError::Forbidden(reason)) => {
                debug!(collection = %self.collection, user_id = identity.user_id, action = action.as_str(), "ownership denied");
                match self.denial {
                    DenialPolicy::NotFound => Err(self.not_found()),
                    DenialPolicy::Forbidden => Err(ServiceError::Forbidden(reason)),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// List records in `state`, scoped to the caller, narrowed by `extra`.
    pub async fn list(
        &self,
        identity: &Identity,
        state: RecordState,
        extra: Value,
        order: Value,
        page: Option<(i64, i64)>,
    ) -> ServiceResult<Listing> {
        let decision = authorize(identity, Action::ReadList, None)?;
        let filter = and_filters([state.predicate(), decision.scope_filter(), extra]);

        let total = self.store.count(self.collection, &filter).await?;
        let mut query = FilterData::matching(filter).order_by(order);
        if let Some((limit, offset)) = page {
            query = query.page(limit, offset);
        }
        let rows = self.store.find(self.collection, &query).await?;
        Ok(Listing { rows, total })
    }

    async fn lookup(&self, identity: &Identity, id: i64, state: RecordState, action: Action) -> ServiceResult<(Document, Decision)> {
        let filter = and_filters([json!({ "id": id }), state.predicate()]);
        let doc = self
            .store
            .find_one(self.collection, &filter)
            .await?
            .ok_or_else(|| self.not_found())?;
        let owner = doc.get("created_by").and_then(Value::as_i64);
        let decision = self.decide(identity, action, owner)?;
        Ok((doc, decision))
    }

    /// Point read of one record in `state` that the caller may act on.
    pub async fn fetch(&self, identity: &Identity, id: i64, state: RecordState, action: Action) -> ServiceResult<Document> {
        Ok(self.lookup(identity, id, state, action).await?.0)
    }

    async fn transition(&self, identity: &Identity, id: i64, from: RecordState, action: Action, patch: Document) -> ServiceResult<()> {
        let (_, decision) = self.lookup(identity, id, from, action).await?;
        let filter = and_filters([json!({ "id": id }), from.predicate(), decision.scope_filter()]);
        let affected = self.store.update(self.collection, &filter, patch).await?;
        if affected == 0 {
            // Lost a race with another writer
            return Err(self.not_found());
        }
        info!(collection = %self.collection, id, user_id = identity.user_id, action = action.as_str(), "record transition applied");
        Ok(())
    }

    async fn reload(&self, id: i64) -> ServiceResult<Document> {
        self.store
            .find_one(self.collection, &json!({ "id": id }))
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Insert with `created_by` forced to the caller and fresh audit timestamps.
    pub async fn create(&self, identity: &Identity, mut record: Document) -> ServiceResult<Document> {
        authorize(identity, Action::Create, None)?;
        let now = now_timestamp();
        record.remove("id");
        record.remove("deleted_at");
        record.insert("created_by".to_string(), json!(identity.user_id));
        record.insert("created_at".to_string(), now.clone());
        record.insert("updated_at".to_string(), now);

        let id = self.store.insert(self.collection, record).await?;
        info!(collection = %self.collection, id, user_id = identity.user_id, "record created");
        self.reload(id).await
    }

    /// Patch an active record. Audit and lifecycle columns are not patchable.
    pub async fn update(&self, identity: &Identity, id: i64, mut patch: Document) -> ServiceResult<Document> {
        for protected in ["id", "created_by", "created_at", "deleted_at"] {
            patch.remove(protected);
        }
        patch.insert("updated_at".to_string(), now_timestamp());
        self.transition(identity, id, RecordState::Active, Action::Update, patch).await?;
        self.reload(id).await
    }

    /// Active -> Trashed. A record already in the trash is NotFound.
    pub async fn soft_delete(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        let mut patch = Document::new();
        patch.insert("deleted_at".to_string(), now_timestamp());
        self.transition(identity, id, RecordState::Active, Action::SoftDelete, patch).await
    }

    /// Trashed -> Active.
    pub async fn restore(&self, identity: &Identity, id: i64) -> ServiceResult<Document> {
        let mut patch = Document::new();
        patch.insert("deleted_at".to_string(), Value::Null);
        patch.insert("updated_at".to_string(), now_timestamp());
        self.transition(identity, id, RecordState::Trashed, Action::Restore, patch).await?;
        self.reload(id).await
    }

    /// Trashed -> Purged. Active records cannot be purged directly.
    pub async fn hard_delete(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        let (_, decision) = self.lookup(identity, id, RecordState::Trashed, Action::HardDelete).await?;
        let filter = and_filters([json!({ "id": id }), RecordState::Trashed.predicate(), decision.scope_filter()]);
        let affected = self.store.delete(self.collection, &filter).await?;
        if affected == 0 {
            return Err(self.not_found());
        }
        info!(collection = %self.collection, id, user_id = identity.user_id, "record purged");
        Ok(())
    }
}
