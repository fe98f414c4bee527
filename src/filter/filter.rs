use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Condition, FilterData, FilterOrderInfo, SqlResult};
use crate::schema::Collection;

/// Validated query over one collection. The relational backend renders it to
/// SQL; the document and memory backends walk [`Filter::condition`] directly.
#[derive(Debug, Clone)]
pub struct Filter {
    collection: Collection,
    condition: Condition,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            condition: Condition::And(vec![]),
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    /// Build a filter from a bare WHERE object.
    pub fn matching(collection: Collection, where_data: &Value) -> Result<Self, FilterError> {
        let mut filter = Self::new(collection);
        filter.where_clause(where_data)?;
        Ok(filter)
    }

    pub fn assign(&mut self, data: &FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = &data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = &data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        else if let Some(offset) = data.offset { self.offset(offset)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: &Value) -> Result<&mut Self, FilterError> {
        self.condition = FilterWhere::parse(self.collection, conditions)?;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: &Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(self.collection, order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        self.limit = Some(limit);
        if let Some(off) = offset { self.offset(off)?; }
        Ok(self)
    }

    fn offset(&mut self, offset: i64) -> Result<&mut Self, FilterError> {
        if offset < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn collection(&self) -> Collection { self.collection }
    pub fn condition(&self) -> &Condition { &self.condition }
    pub fn order_infos(&self) -> &[FilterOrderInfo] { &self.order_data }
    pub fn limit_value(&self) -> Option<i64> { self.limit }
    pub fn offset_value(&self) -> Option<i64> { self.offset }

    /// Explicit column list, never `*`
    pub fn select_list(&self, alias: Option<&str>) -> String {
        self.collection
            .column_names()
            .map(|c| match alias {
                Some(a) => format!("{}.\"{}\"", a, c),
                None => format!("\"{}\"", c),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT row_to_json(t) AS row FROM (...) t` so rows decode as JSON documents.
    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(self.collection, &self.condition, None, 0);
        let order_clause = FilterOrder::generate(&self.order_data, None);
        let limit_clause = self.build_limit_clause();

        let inner = [
            format!("SELECT {}", self.select_list(None)),
            format!("FROM \"{}\"", self.collection.table_name()),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        SqlResult { query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner), params }
    }

    pub fn to_where_sql(&self, alias: Option<&str>, starting_param_index: usize) -> SqlResult {
        let (query, params) = FilterWhere::generate(self.collection, &self.condition, alias, starting_param_index);
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql(None, 0);
        SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.collection.table_name(), where_result.query),
            params: where_result.params,
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_wraps_explicit_columns_in_row_to_json() {
        let data = FilterData::matching(json!({"deleted_at": {"$exists": false}, "created_by": 2}))
            .order_by(json!(["created_at desc", "id asc"]))
            .page(5, 10);
        let mut filter = Filter::new(Collection::Pekerjaan);
        filter.assign(&data).unwrap();
        let sql = filter.to_sql();

        assert!(sql.query.starts_with("SELECT row_to_json(t) AS row FROM (SELECT \"id\", \"alumni_id\""));
        assert!(sql.query.contains("FROM \"pekerjaan_alumni\" WHERE (\"created_by\" = $1) AND (\"deleted_at\" IS NULL)"));
        assert!(sql.query.contains("ORDER BY \"created_at\" DESC, \"id\" ASC LIMIT 5 OFFSET 10) t"));
        assert!(!sql.query.contains('*'));
        assert_eq!(sql.params, vec![json!(2)]);
    }

    #[test]
    fn count_without_where_matches_all() {
        let sql = Filter::new(Collection::Alumni).to_count_sql();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"alumni\" WHERE 1=1");
    }

    #[test]
    fn negative_limits_are_rejected() {
        let mut filter = Filter::new(Collection::Alumni);
        assert!(filter.limit(-1, None).is_err());
        assert!(filter.limit(10, Some(-5)).is_err());
    }
}
