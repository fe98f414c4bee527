use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, Store, StoreError};
use crate::filter::filter_where::scalar_fits;
use crate::filter::like::ilike_matches;
use crate::filter::{Condition, Filter, FilterData, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};
use crate::schema::{Collection, FieldKind};

const COLLECTIONS: [Collection; 3] = [Collection::Users, Collection::Alumni, Collection::Pekerjaan];

/// In-process document store with the same absent-vs-null rules as the
/// document backend. Backs `DB_TYPE=memory` and the test suites.
pub struct MemoryStore {
    tables: RwLock<HashMap<Collection, BTreeMap<i64, Document>>>,
    sequences: HashMap<Collection, AtomicI64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(COLLECTIONS.iter().map(|c| (*c, BTreeMap::new())).collect()),
            sequences: COLLECTIONS.iter().map(|c| (*c, AtomicI64::new(0))).collect(),
        }
    }

    fn next_id(&self, collection: Collection) -> i64 {
        self.sequences
            .get(&collection)
            .map(|seq| seq.fetch_add(1, AtomicOrdering::SeqCst) + 1)
            .unwrap_or(1)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, collection: Collection, query: &FilterData) -> Result<Vec<Document>, StoreError> {
        let mut filter = Filter::new(collection);
        filter.assign(query)?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Document> = tables
            .get(&collection)
            .map(|t| t.values().filter(|doc| matches(collection, filter.condition(), doc)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        sort_documents(collection, &mut rows, filter.order_infos());

        let offset = filter.offset_value().unwrap_or(0).max(0) as usize;
        let limit = filter.limit_value().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_one(&self, collection: Collection, filter: &Value) -> Result<Option<Document>, StoreError> {
        let filter = Filter::matching(collection, filter)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .and_then(|t| t.values().find(|doc| matches(collection, filter.condition(), doc)).cloned()))
    }

    async fn insert(&self, collection: Collection, mut record: Document) -> Result<i64, StoreError> {
        record.remove("id");
        record.retain(|_, v| !v.is_null());
        for (column, value) in record.iter() {
            check_column(collection, column, value)?;
        }

        let id = self.next_id(collection);
        record.insert("id".to_string(), Value::from(id));

        let mut tables = self.tables.write().await;
        tables.entry(collection).or_default().insert(id, record);
        Ok(id)
    }

    async fn update(&self, collection: Collection, filter: &Value, patch: Document) -> Result<u64, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Query("update requires at least one field".to_string()));
        }
        for (column, value) in patch.iter() {
            if !value.is_null() {
                check_column(collection, column, value)?;
            } else if collection.field_kind(column).is_none() {
                return Err(StoreError::Query(format!("unknown column '{}' on {}", column, collection)));
            }
        }
        let filter = Filter::matching(collection, filter)?;

        let mut tables = self.tables.write().await;
        let mut affected = 0;
        if let Some(table) = tables.get_mut(&collection) {
            for doc in table.values_mut() {
                if !matches(collection, filter.condition(), doc) {
                    continue;
                }
                for (column, value) in patch.iter() {
                    if column == "id" {
                        continue;
                    }
                    if value.is_null() {
                        doc.remove(column);
                    } else {
                        doc.insert(column.clone(), value.clone());
                    }
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError> {
        let filter = Filter::matching(collection, filter)?;
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&collection) else { return Ok(0) };
        let before = table.len();
        table.retain(|_, doc| !matches(collection, filter.condition(), doc));
        Ok((before - table.len()) as u64)
    }

    async fn count(&self, collection: Collection, filter: &Value) -> Result<u64, StoreError> {
        let filter = Filter::matching(collection, filter)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .map(|t| t.values().filter(|doc| matches(collection, filter.condition(), doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn alumni_with_pekerjaan(&self, alumni_filter: &Value, job_filter: &Value) -> Result<Vec<Document>, StoreError> {
        let alumni_filter = Filter::matching(Collection::Alumni, alumni_filter)?;
        let job_filter = Filter::matching(Collection::Pekerjaan, job_filter)?;
        let job_order = [
            FilterOrderInfo { column: "tanggal_mulai_kerja".to_string(), sort: SortDirection::Desc },
            FilterOrderInfo { column: "id".to_string(), sort: SortDirection::Asc },
        ];

        let tables = self.tables.read().await;
        let empty = BTreeMap::new();
        let alumni = tables.get(&Collection::Alumni).unwrap_or(&empty);
        let jobs = tables.get(&Collection::Pekerjaan).unwrap_or(&empty);

        let mut out = Vec::new();
        // BTreeMap iteration is already id-ascending
        for (id, doc) in alumni.iter() {
            if !matches(Collection::Alumni, alumni_filter.condition(), doc) {
                continue;
            }
            let mut owned: Vec<Document> = jobs
                .values()
                .filter(|job| job.get("alumni_id").and_then(Value::as_i64) == Some(*id))
                .filter(|job| matches(Collection::Pekerjaan, job_filter.condition(), job))
                .cloned()
                .collect();
            sort_documents(Collection::Pekerjaan, &mut owned, &job_order);

            let mut row = doc.clone();
            row.insert("pekerjaan".to_string(), Value::Array(owned.into_iter().map(Value::Object).collect()));
            out.push(row);
        }
        Ok(out)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn check_column(collection: Collection, column: &str, value: &Value) -> Result<(), StoreError> {
    let kind = collection
        .field_kind(column)
        .ok_or_else(|| StoreError::Query(format!("unknown column '{}' on {}", column, collection)))?;
    if !scalar_fits(kind, value) {
        return Err(StoreError::Query(format!("value for '{}' does not match column type", column)));
    }
    Ok(())
}

/// Present and non-null, the only state that counts as "set".
fn present<'a>(doc: &'a Document, column: &str) -> Option<&'a Value> {
    doc.get(column).filter(|v| !v.is_null())
}

pub(crate) fn matches(collection: Collection, condition: &Condition, doc: &Document) -> bool {
    match condition {
        Condition::And(children) => children.iter().all(|c| matches(collection, c, doc)),
        Condition::Or(children) => children.iter().any(|c| matches(collection, c, doc)),
        Condition::Not(inner) => !matches(collection, inner, doc),
        Condition::Field(info) => field_matches(collection, info, doc),
    }
}

fn field_matches(collection: Collection, info: &FilterWhereInfo, doc: &Document) -> bool {
    let kind = collection.field_kind(&info.column).unwrap_or(FieldKind::Text);
    let value = present(doc, &info.column);
    match info.operator {
        FilterOp::Exists => value.is_some() == info.data.as_bool().unwrap_or(false),
        FilterOp::Eq if info.data.is_null() => value.is_none(),
        FilterOp::Eq => value.map_or(false, |v| compare(kind, v, &info.data) == Some(Ordering::Equal)),
        FilterOp::Gt => value.map_or(false, |v| compare(kind, v, &info.data) == Some(Ordering::Greater)),
        FilterOp::Gte => value.map_or(false, |v| matches!(compare(kind, v, &info.data), Some(Ordering::Greater | Ordering::Equal))),
        FilterOp::Lt => value.map_or(false, |v| compare(kind, v, &info.data) == Some(Ordering::Less)),
        FilterOp::Lte => value.map_or(false, |v| matches!(compare(kind, v, &info.data), Some(Ordering::Less | Ordering::Equal))),
        FilterOp::ILike => match (value.and_then(Value::as_str), info.data.as_str()) {
            (Some(text), Some(pattern)) => ilike_matches(pattern, text),
            _ => false,
        },
        FilterOp::In => match (value, info.data.as_array()) {
            (Some(v), Some(options)) => options.iter().any(|o| compare(kind, v, o) == Some(Ordering::Equal)),
            _ => false,
        },
    }
}

fn compare(kind: FieldKind, a: &Value, b: &Value) -> Option<Ordering> {
    match kind {
        FieldKind::Int => Some(a.as_i64()?.cmp(&b.as_i64()?)),
        FieldKind::Text => Some(a.as_str()?.cmp(b.as_str()?)),
        FieldKind::Date => {
            let a = NaiveDate::parse_from_str(a.as_str()?, "%Y-%m-%d").ok()?;
            let b = NaiveDate::parse_from_str(b.as_str()?, "%Y-%m-%d").ok()?;
            Some(a.cmp(&b))
        }
        FieldKind::Timestamp => {
            let a = DateTime::parse_from_rfc3339(a.as_str()?).ok()?;
            let b = DateTime::parse_from_rfc3339(b.as_str()?).ok()?;
            Some(a.cmp(&b))
        }
    }
}

/// Sort like PostgreSQL: nulls last ascending, first descending.
fn sort_documents(collection: Collection, rows: &mut [Document], order: &[FilterOrderInfo]) {
    rows.sort_by(|a, b| {
        for info in order {
            let kind = collection.field_kind(&info.column).unwrap_or(FieldKind::Text);
            let ord = match (present(a, &info.column), present(b, &info.column)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => compare(kind, x, y).unwrap_or(Ordering::Equal),
            };
            let ord = match info.sort {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}
