use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson},
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions, ReturnDocument,
        UpdateOptions,
    },
    Client, Database, IndexModel,
};
use serde_json::Value;
use tracing::{debug, info};

use super::{Document, Store, StoreError};
use crate::config::StoreConfig;
use crate::filter::filter_where::scalar_fits;
use crate::filter::like::like_to_regex;
use crate::filter::{Condition, Filter, FilterData, FilterOp, FilterOrderInfo, FilterWhereInfo};
use crate::schema::{Collection, FieldKind};

const COUNTERS: &str = "counters";

/// Document backend. Optional values are absent fields, ids live in `_id`
/// and come from the `counters` collection, dates are BSON datetimes.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let uri = config
            .mongo_uri
            .as_deref()
            .ok_or_else(|| StoreError::Connection("MONGO_URI is not set".to_string()))?;

        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("alumni-api".to_string());
        options.connect_timeout = Some(Duration::from_secs(config.connection_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.connection_timeout_secs));
        options.max_pool_size = Some(config.max_connections);

        let client = Client::with_options(options)?;
        let store = Self::from_database(client.database(&config.mongo_database));
        store.health_check().await?;
        info!("Connected to MongoDB database '{}'", config.mongo_database);

        store.ensure_indexes().await?;
        store.sync_counters().await?;
        Ok(store)
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<bson::Document> {
        self.db.collection::<bson::Document>(collection.table_name())
    }

    /// Natural keys that the relational schema declares UNIQUE.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        for (collection, field) in [(Collection::Alumni, "nim"), (Collection::Users, "username"), (Collection::Users, "email")] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection(collection).create_index(index, None).await?;
        }
        Ok(())
    }

    /// Atomically allocate the next id for `collection`.
    async fn next_id(&self, collection: Collection) -> Result<i64, StoreError> {
        let mut options = FindOneAndUpdateOptions::default();
        options.upsert = Some(true);
        options.return_document = Some(ReturnDocument::After);

        let counter = self
            .db
            .collection::<bson::Document>(COUNTERS)
            .find_one_and_update(counter_key(collection), counter_increment(), options)
            .await?
            .ok_or_else(|| StoreError::Decode("counter upsert returned no document".to_string()))?;

        bson_i64(counter.get("seq"))
            .ok_or_else(|| StoreError::Decode(format!("counter '{}' has no numeric seq", collection.counter_name())))
    }

    /// Raise each counter to at least the highest stored id. `$max` never
    /// lowers a counter, so restarts and repeated calls are harmless.
    async fn sync_counters(&self) -> Result<(), StoreError> {
        let counters = self.db.collection::<bson::Document>(COUNTERS);
        for collection in [Collection::Users, Collection::Alumni, Collection::Pekerjaan] {
            let mut find = FindOneOptions::default();
            find.sort = Some(doc! { "_id": -1 });
            find.projection = Some(doc! { "_id": 1 });

            let top = self.collection(collection).find_one(doc! {}, find).await?;
            if let Some(max) = top.and_then(|d| bson_i64(d.get("_id"))) {
                let mut upsert = UpdateOptions::default();
                upsert.upsert = Some(true);
                counters.update_one(counter_key(collection), counter_floor(max), upsert).await?;
                debug!("Counter {} synced to at least {}", collection.counter_name(), max);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find(&self, collection: Collection, query: &FilterData) -> Result<Vec<Document>, StoreError> {
        let mut filter = Filter::new(collection);
        filter.assign(query)?;
        let matcher = condition_to_bson(collection, filter.condition())?;

        let mut options = FindOptions::default();
        if !filter.order_infos().is_empty() {
            options.sort = Some(sort_document(filter.order_infos()));
        }
        options.skip = filter.offset_value().map(|o| o.max(0) as u64);
        options.limit = filter.limit_value();

        debug!(collection = %collection, filter = %matcher, "mongo find");
        let cursor = self.collection(collection).find(matcher, options).await?;
        let docs: Vec<bson::Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(|d| from_document(collection, d)).collect())
    }

    async fn find_one(&self, collection: Collection, filter: &Value) -> Result<Option<Document>, StoreError> {
        let filter = Filter::matching(collection, filter)?;
        let matcher = condition_to_bson(collection, filter.condition())?;
        let found = self.collection(collection).find_one(matcher, None).await?;
        Ok(found.map(|d| from_document(collection, d)))
    }

    async fn insert(&self, collection: Collection, record: Document) -> Result<i64, StoreError> {
        let mut document = bson::Document::new();
        for (column, value) in record.iter() {
            if column == "id" || value.is_null() {
                continue;
            }
            document.insert(column.clone(), to_bson(collection, column, value)?);
        }

        let id = self.next_id(collection).await?;
        document.insert("_id", id);
        self.collection(collection).insert_one(document, None).await?;
        Ok(id)
    }

    async fn update(&self, collection: Collection, filter: &Value, patch: Document) -> Result<u64, StoreError> {
        let update = update_document(collection, &patch)?;
        let filter = Filter::matching(collection, filter)?;
        let matcher = condition_to_bson(collection, filter.condition())?;
        debug!(collection = %collection, filter = %matcher, update = %update, "mongo update");
        let result = self.collection(collection).update_many(matcher, update, None).await?;
        Ok(result.matched_count)
    }

    async fn delete(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError> {
        let filter = Filter::matching(collection, filter)?;
        let matcher = condition_to_bson(collection, filter.condition())?;
        let result = self.collection(collection).delete_many(matcher, None).await?;
        Ok(result.deleted_count)
    }

    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError> {
        let filter = Filter::matching(collection, filter)?;
        let matcher = condition_to_bson(collection, filter.condition())?;
        Ok(self.collection(collection).count_documents(matcher, None).await?)
    }

    async fn alumni_with_pekerjaan(&self, alumni_filter: &Value, job_filter: &Value) -> Result<Vec<Document>, StoreError> {
        let alumni = Filter::matching(Collection::Alumni, alumni_filter)?;
        let jobs = Filter::matching(Collection::Pekerjaan, job_filter)?;
        let pipeline = join_pipeline(
            condition_to_bson(Collection::Alumni, alumni.condition())?,
            condition_to_bson(Collection::Pekerjaan, jobs.condition())?,
        );

        let cursor = self.collection(Collection::Alumni).aggregate(pipeline, None).await?;
        let docs: Vec<bson::Document> = cursor.try_collect().await?;

        Ok(docs
            .into_iter()
            .map(|mut d| {
                let jobs = match d.remove("pekerjaan") {
                    Some(Bson::Array(items)) => items
                        .into_iter()
                        .filter_map(|b| match b {
                            Bson::Document(job) => Some(Value::Object(from_document(Collection::Pekerjaan, job))),
                            _ => None,
                        })
                        .collect(),
                    _ => vec![],
                };
                let mut row = from_document(Collection::Alumni, d);
                row.insert("pekerjaan".to_string(), Value::Array(jobs));
                row
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

fn counter_key(collection: Collection) -> bson::Document {
    doc! { "_id": collection.counter_name() }
}

fn counter_increment() -> bson::Document {
    doc! { "$inc": { "seq": 1_i64 } }
}

fn counter_floor(max: i64) -> bson::Document {
    doc! { "$max": { "seq": max } }
}

/// Null patch values become `$unset` so optional fields stay absent.
fn update_document(collection: Collection, patch: &Document) -> Result<bson::Document, StoreError> {
    let mut set = bson::Document::new();
    let mut unset = bson::Document::new();
    for (column, value) in patch.iter() {
        if column == "id" {
            continue;
        }
        if value.is_null() {
            collection.field_kind(column).ok_or_else(|| unknown_column(collection, column))?;
            unset.insert(column.clone(), "");
        } else {
            set.insert(column.clone(), to_bson(collection, column, value)?);
        }
    }
    if set.is_empty() && unset.is_empty() {
        return Err(StoreError::Query("update requires at least one field".to_string()));
    }

    let mut update = bson::Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    Ok(update)
}

fn join_pipeline(alumni_match: bson::Document, job_match: bson::Document) -> Vec<bson::Document> {
    vec![
        doc! { "$match": alumni_match },
        doc! { "$sort": { "_id": 1 } },
        doc! { "$lookup": {
            "from": Collection::Pekerjaan.table_name(),
            "let": { "aid": "$_id" },
            "pipeline": [
                { "$match": { "$expr": { "$eq": ["$alumni_id", "$$aid"] } } },
                { "$match": job_match },
                { "$sort": { "tanggal_mulai_kerja": -1, "_id": 1 } },
            ],
            "as": "pekerjaan",
        } },
    ]
}

fn field_key(column: &str) -> &str {
    if column == "id" { "_id" } else { column }
}

fn sort_document(order: &[FilterOrderInfo]) -> bson::Document {
    let mut sort = bson::Document::new();
    for info in order {
        sort.insert(field_key(&info.column), info.sort.sign());
    }
    sort
}

/// Render a parsed condition as a MongoDB query document. Absent and
/// explicit-null fields are both treated as "not set".
pub(crate) fn condition_to_bson(collection: Collection, condition: &Condition) -> Result<bson::Document, StoreError> {
    match condition {
        Condition::And(children) if children.is_empty() => Ok(doc! {}),
        Condition::And(children) => Ok(doc! { "$and": children_to_bson(collection, children)? }),
        // Empty disjunction matches nothing
        Condition::Or(children) if children.is_empty() => Ok(doc! { "_id": { "$in": [] } }),
        Condition::Or(children) => Ok(doc! { "$or": children_to_bson(collection, children)? }),
        Condition::Not(inner) => Ok(doc! { "$nor": [condition_to_bson(collection, inner)?] }),
        Condition::Field(info) => field_to_bson(collection, info),
    }
}

fn children_to_bson(collection: Collection, children: &[Condition]) -> Result<Vec<bson::Document>, StoreError> {
    children.iter().map(|c| condition_to_bson(collection, c)).collect()
}

fn field_to_bson(collection: Collection, info: &FilterWhereInfo) -> Result<bson::Document, StoreError> {
    let key = field_key(&info.column);
    let unset = || doc! { "$or": [ { key: { "$exists": false } }, { key: { "$type": "null" } } ] };

    Ok(match info.operator {
        FilterOp::Exists if info.data.as_bool().unwrap_or(false) => {
            doc! { key: { "$exists": true, "$not": { "$type": "null" } } }
        }
        FilterOp::Exists => unset(),
        FilterOp::Eq if info.data.is_null() => unset(),
        FilterOp::Eq => doc! { key: { "$eq": to_bson(collection, &info.column, &info.data)? } },
        FilterOp::Gt => doc! { key: { "$gt": to_bson(collection, &info.column, &info.data)? } },
        FilterOp::Gte => doc! { key: { "$gte": to_bson(collection, &info.column, &info.data)? } },
        FilterOp::Lt => doc! { key: { "$lt": to_bson(collection, &info.column, &info.data)? } },
        FilterOp::Lte => doc! { key: { "$lte": to_bson(collection, &info.column, &info.data)? } },
        FilterOp::ILike => {
            let pattern = info.data.as_str().unwrap_or_default();
            doc! { key: { "$regex": like_to_regex(pattern), "$options": "i" } }
        }
        FilterOp::In => {
            let values = info
                .data
                .as_array()
                .map(|items| items.iter().map(|v| to_bson(collection, &info.column, v)).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            doc! { key: { "$in": values } }
        }
    })
}

fn unknown_column(collection: Collection, column: &str) -> StoreError {
    StoreError::Query(format!("unknown column '{}' on {}", column, collection))
}

fn to_bson(collection: Collection, column: &str, value: &Value) -> Result<Bson, StoreError> {
    let kind = collection.field_kind(column).ok_or_else(|| unknown_column(collection, column))?;
    if value.is_null() {
        return Ok(Bson::Null);
    }
    if !scalar_fits(kind, value) {
        return Err(StoreError::Query(format!("value for '{}' does not match column type", column)));
    }

    let mismatch = || StoreError::Query(format!("value for '{}' does not match column type", column));
    Ok(match kind {
        FieldKind::Int => Bson::Int64(value.as_i64().ok_or_else(mismatch)?),
        FieldKind::Text => Bson::String(value.as_str().ok_or_else(mismatch)?.to_string()),
        FieldKind::Date => {
            let date = NaiveDate::parse_from_str(value.as_str().ok_or_else(mismatch)?, "%Y-%m-%d").map_err(|_| mismatch())?;
            let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(mismatch)?;
            Bson::DateTime(bson::DateTime::from_millis(Utc.from_utc_datetime(&midnight).timestamp_millis()))
        }
        FieldKind::Timestamp => {
            let instant = DateTime::parse_from_rfc3339(value.as_str().ok_or_else(mismatch)?).map_err(|_| mismatch())?;
            Bson::DateTime(bson::DateTime::from_millis(instant.timestamp_millis()))
        }
    })
}

fn from_bson(kind: Option<FieldKind>, value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::DateTime(dt) => match Utc.timestamp_millis_opt(dt.timestamp_millis()).single() {
            Some(instant) if kind == Some(FieldKind::Date) => Value::String(instant.format("%Y-%m-%d").to_string()),
            Some(instant) => Value::String(instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Value::Null,
        },
        other => other.into_relaxed_extjson(),
    }
}

fn from_document(collection: Collection, document: bson::Document) -> Document {
    let mut out = Document::new();
    for (key, value) in document {
        let column = if key == "_id" { "id".to_string() } else { key };
        let kind = collection.field_kind(&column);
        out.insert(column, from_bson(kind, value));
    }
    out
}

fn bson_i64(value: Option<&Bson>) -> Option<i64> {
    match value? {
        Bson::Int64(n) => Some(*n),
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Double(f) => Some(*f as i64),
        _ => None,
    }
}
