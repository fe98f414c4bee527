use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::schema::Collection;

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(collection: Collection, order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["created_at desc", "id asc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)),
                        other => return Err(FilterError::InvalidOrder(format!("expected string, got {}", other))),
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "nama": "asc" }
                obj.iter()
                    .map(|(k, v)| FilterOrderInfo {
                        column: k.clone(),
                        sort: Self::direction(v.as_str().unwrap_or("asc")),
                    })
                    .collect()
            }
            other => return Err(FilterError::InvalidOrder(format!("unsupported order spec {}", other))),
        };

        for info in &infos {
            if collection.field_kind(&info.column).is_none() {
                return Err(FilterError::InvalidColumn {
                    collection: collection.to_string(),
                    column: info.column.clone(),
                });
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        // split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut it = part.split_whitespace();
            if let Some(col) = it.next() {
                let sort = Self::direction(it.next().unwrap_or("asc"));
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        out
    }

    fn direction(s: &str) -> SortDirection {
        if s.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    pub fn generate(infos: &[FilterOrderInfo], alias: Option<&str>) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| match alias {
                Some(a) => format!("{}.\"{}\" {}", a, i.column, i.sort.to_sql()),
                None => format!("\"{}\" {}", i.column, i.sort.to_sql()),
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
