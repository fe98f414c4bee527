use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{Condition, FilterOp, FilterWhereInfo};
use crate::schema::{Collection, FieldKind};

/// Parses the JSON WHERE vocabulary into a [`Condition`] tree and renders
/// that tree as parameterized PostgreSQL.
pub struct FilterWhere<'a> {
    collection: Collection,
    alias: Option<&'a str>,
    param_values: Vec<Value>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(collection: Collection, alias: Option<&'a str>, starting_param_index: usize) -> Self {
        Self {
            collection,
            alias,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Parse and validate a WHERE object against the collection's columns.
    pub fn parse(collection: Collection, where_data: &Value) -> Result<Condition, FilterError> {
        match where_data {
            Value::Null => Ok(Condition::And(vec![])),
            Value::Object(obj) => Self::parse_object(collection, obj),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    /// Render a parsed condition. Placeholders continue from `starting_param_index`.
    pub fn generate(
        collection: Collection,
        condition: &Condition,
        alias: Option<&str>,
        starting_param_index: usize,
    ) -> (String, Vec<Value>) {
        let mut filter_where = FilterWhere::new(collection, alias, starting_param_index);
        let sql = filter_where.build(condition);
        (sql, filter_where.param_values)
    }

    fn parse_object(collection: Collection, obj: &Map<String, Value>) -> Result<Condition, FilterError> {
        let mut parts = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(Self::parse_logical_operator(collection, key, value)?);
            } else {
                parts.extend(Self::parse_field_condition(collection, key, value)?);
            }
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Condition::And(parts)
        })
    }

    fn parse_logical_operator(collection: Collection, op: &str, value: &Value) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let children = arr
                    .iter()
                    .map(|v| Self::parse(collection, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { Condition::And(children) } else { Condition::Or(children) })
            }
            "$not" => Ok(Condition::Not(Box::new(Self::parse(collection, value)?))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(collection: Collection, field: &str, value: &Value) -> Result<Vec<Condition>, FilterError> {
        let kind = collection.field_kind(field).ok_or_else(|| FilterError::InvalidColumn {
            collection: collection.to_string(),
            column: field.to_string(),
        })?;

        let mut out = Vec::new();
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    Self::validate_operand(field, kind, operator, op_val)?;
                    out.push(Condition::Field(FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    }));
                }
            }
            Value::Object(_) => {
                return Err(FilterError::InvalidOperatorData(format!(
                    "'{}' expects a scalar or an operator object",
                    field
                )))
            }
            _ => {
                // Implicit equality: { field: value }
                Self::validate_operand(field, kind, FilterOp::Eq, value)?;
                out.push(Condition::Field(FilterWhereInfo {
                    column: field.to_string(),
                    operator: FilterOp::Eq,
                    data: value.clone(),
                }));
            }
        }
        Ok(out)
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$exists" => FilterOp::Exists,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn validate_operand(field: &str, kind: FieldKind, op: FilterOp, data: &Value) -> Result<(), FilterError> {
        let invalid = |msg: &str| Err(FilterError::InvalidOperatorData(format!("{} on '{}': {}", op_name(op), field, msg)));
        match op {
            FilterOp::Exists => {
                if data.is_boolean() { Ok(()) } else { invalid("expects a boolean") }
            }
            FilterOp::ILike => {
                if kind == FieldKind::Text && data.is_string() { Ok(()) } else { invalid("expects a text column and a string pattern") }
            }
            FilterOp::In => match data {
                Value::Array(values) => {
                    for v in values {
                        if !scalar_fits(kind, v) {
                            return invalid("contains a value of the wrong type");
                        }
                    }
                    Ok(())
                }
                _ => invalid("expects an array"),
            },
            FilterOp::Eq if data.is_null() => Ok(()),
            _ => {
                if scalar_fits(kind, data) { Ok(()) } else { invalid("value does not match column type") }
            }
        }
    }

    fn build(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Field(info) => self.build_sql_condition(info),
            Condition::And(children) => {
                if children.is_empty() {
                    return "1=1".to_string();
                }
                let parts: Vec<String> = children.iter().map(|c| format!("({})", self.build(c))).collect();
                parts.join(" AND ")
            }
            Condition::Or(children) => {
                if children.is_empty() {
                    return "1=0".to_string();
                }
                let parts: Vec<String> = children.iter().map(|c| format!("({})", self.build(c))).collect();
                parts.join(" OR ")
            }
            Condition::Not(inner) => format!("NOT ({})", self.build(inner)),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let column = self.quoted_column(&condition.column);
        let kind = self.collection.field_kind(&condition.column).unwrap_or(FieldKind::Text);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { format!("{} IS NULL", column) }
                else { format!("{} = {}", column, self.param(condition.data.clone(), kind)) }
            }
            FilterOp::Gt => format!("{} > {}", column, self.param(condition.data.clone(), kind)),
            FilterOp::Gte => format!("{} >= {}", column, self.param(condition.data.clone(), kind)),
            FilterOp::Lt => format!("{} < {}", column, self.param(condition.data.clone(), kind)),
            FilterOp::Lte => format!("{} <= {}", column, self.param(condition.data.clone(), kind)),
            FilterOp::ILike => format!("{} ILIKE {}", column, self.param(condition.data.clone(), FieldKind::Text)),
            FilterOp::In => {
                let values = condition.data.as_array().cloned().unwrap_or_default();
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v, kind)).collect();
                format!("{} IN ({})", column, params.join(", "))
            }
            FilterOp::Exists => {
                if condition.data.as_bool().unwrap_or(false) { format!("{} IS NOT NULL", column) }
                else { format!("{} IS NULL", column) }
            }
        }
    }

    fn quoted_column(&self, column: &str) -> String {
        match self.alias {
            Some(alias) => format!("{}.\"{}\"", alias, column),
            None => format!("\"{}\"", column),
        }
    }

    fn param(&mut self, value: Value, kind: FieldKind) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        match kind.sql_cast() {
            Some(cast) => format!("CAST(${} AS {})", self.param_index, cast),
            None => format!("${}", self.param_index),
        }
    }
}

fn op_name(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Eq => "$eq",
        FilterOp::Gt => "$gt",
        FilterOp::Gte => "$gte",
        FilterOp::Lt => "$lt",
        FilterOp::Lte => "$lte",
        FilterOp::ILike => "$ilike",
        FilterOp::In => "$in",
        FilterOp::Exists => "$exists",
    }
}

/// Whether a JSON scalar is a valid value for a column of `kind`.
pub fn scalar_fits(kind: FieldKind, value: &Value) -> bool {
    match (kind, value) {
        (FieldKind::Int, Value::Number(n)) => n.is_i64(),
        (FieldKind::Text, Value::String(_)) => true,
        (FieldKind::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        (FieldKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(collection: Collection, where_data: Value, alias: Option<&str>, start: usize) -> (String, Vec<Value>) {
        let condition = FilterWhere::parse(collection, &where_data).unwrap();
        FilterWhere::generate(collection, &condition, alias, start)
    }

    #[test]
    fn lifecycle_predicates_render_as_null_checks() {
        let (sql, params) = render(Collection::Pekerjaan, json!({"deleted_at": {"$exists": false}}), None, 0);
        assert_eq!(sql, "\"deleted_at\" IS NULL");
        assert!(params.is_empty());

        let (sql, _) = render(Collection::Pekerjaan, json!({"deleted_at": {"$exists": true}}), None, 0);
        assert_eq!(sql, "\"deleted_at\" IS NOT NULL");
    }

    #[test]
    fn placeholders_continue_from_starting_index() {
        let (sql, params) = render(
            Collection::Alumni,
            json!({"$and": [{"id": 7}, {"created_by": 3}]}),
            Some("a"),
            2,
        );
        assert_eq!(sql, "(a.\"id\" = $3) AND (a.\"created_by\" = $4)");
        assert_eq!(params, vec![json!(7), json!(3)]);
    }

    #[test]
    fn dates_are_cast() {
        let (sql, params) = render(
            Collection::Pekerjaan,
            json!({"tanggal_mulai_kerja": {"$lt": "2024-01-01"}}),
            None,
            0,
        );
        assert_eq!(sql, "\"tanggal_mulai_kerja\" < CAST($1 AS DATE)");
        assert_eq!(params, vec![json!("2024-01-01")]);
    }

    #[test]
    fn or_of_ilike_for_search() {
        let (sql, params) = render(
            Collection::Pekerjaan,
            json!({"$or": [
                {"nama_perusahaan": {"$ilike": "%tech%"}},
                {"posisi_jabatan": {"$ilike": "%tech%"}}
            ]}),
            None,
            0,
        );
        assert_eq!(sql, "(\"nama_perusahaan\" ILIKE $1) OR (\"posisi_jabatan\" ILIKE $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = render(Collection::Alumni, json!({"id": {"$in": []}}), None, 0);
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = FilterWhere::parse(Collection::Alumni, &json!({"password": "x"})).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { .. }));
    }

    #[test]
    fn mistyped_operands_are_rejected() {
        assert!(FilterWhere::parse(Collection::Alumni, &json!({"id": "7"})).is_err());
        assert!(FilterWhere::parse(Collection::Pekerjaan, &json!({"tanggal_mulai_kerja": "01/02/2024"})).is_err());
        assert!(FilterWhere::parse(Collection::Alumni, &json!({"deleted_at": {"$exists": "no"}})).is_err());
        assert!(FilterWhere::parse(Collection::Alumni, &json!({"angkatan": {"$ilike": "%1%"}})).is_err());
    }

    #[test]
    fn not_wraps_subclause() {
        let (sql, _) = render(Collection::Alumni, json!({"$not": {"jurusan": "Informatika"}}), None, 0);
        assert_eq!(sql, "NOT (\"jurusan\" = $1)");
    }
}
