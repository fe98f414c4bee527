//! Pagination / search / sort resolver
//!
//! Turns raw query-string values into a bounded, whitelisted page request.
//! Nothing here fails: bad input falls back to the entity defaults.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::filter::like::escape_like;
use crate::filter::SortDirection;

pub const MAX_LIMIT: u32 = 100;

/// Per-entity listing rules.
#[derive(Debug, Clone, Copy)]
pub struct ListProfile {
    pub default_limit: u32,
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
    pub default_order: SortDirection,
    pub search_fields: &'static [&'static str],
}

pub const PEKERJAAN_PROFILE: ListProfile = ListProfile {
    default_limit: 5,
    sortable: &["id", "nama_perusahaan", "posisi_jabatan", "tanggal_mulai_kerja", "created_at"],
    default_sort: "created_at",
    default_order: SortDirection::Desc,
    search_fields: &["nama_perusahaan", "posisi_jabatan"],
};

pub const ALUMNI_PROFILE: ListProfile = ListProfile {
    default_limit: 10,
    sortable: &["id", "nim", "nama", "jurusan", "angkatan", "tahun_lulus", "created_at"],
    default_sort: "id",
    default_order: SortDirection::Asc,
    search_fields: &["nama", "nim", "jurusan"],
};

/// Raw query parameters, all optional strings so nothing is rejected at extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    pub sort_by: String,
    pub order: SortDirection,
    pub search: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    #[serde(rename = "sortBy")]
    pub sort_by: String,
    pub order: &'static str,
    pub search: String,
}

pub fn resolve(raw: &ListParams, profile: &ListProfile) -> PageRequest {
    let page = raw
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .map(|p| p.min(u32::MAX as i64) as u32)
        .unwrap_or(1);

    let limit = raw
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse::<i64>().ok())
        .filter(|l| (1..=MAX_LIMIT as i64).contains(l))
        .map(|l| l as u32)
        .unwrap_or(profile.default_limit);

    let sort_by = match raw.sort_by.as_deref().map(str::trim) {
        None | Some("") => profile.default_sort.to_string(),
        Some(s) if profile.sortable.contains(&s) => s.to_string(),
        Some(_) => "id".to_string(),
    };

    let order = match raw.order.as_deref().map(str::trim) {
        None | Some("") => profile.default_order,
        Some(o) if o.eq_ignore_ascii_case("desc") => SortDirection::Desc,
        Some(_) => SortDirection::Asc,
    };

    PageRequest {
        page,
        limit,
        offset: (page as u64 - 1).saturating_mul(limit as u64),
        sort_by,
        order,
        search: raw.search.as_deref().map(str::trim).unwrap_or_default().to_string(),
    }
}

impl PageRequest {
    /// Requested sort plus `id ASC` as the stable tiebreaker.
    pub fn order_spec(&self) -> Value {
        if self.sort_by == "id" {
            json!([format!("id {}", self.order.as_str())])
        } else {
            json!([format!("{} {}", self.sort_by, self.order.as_str()), "id asc"])
        }
    }

    /// Case-insensitive substring match across the profile's search fields,
    /// `null` when there is nothing to search for.
    pub fn search_filter(&self, profile: &ListProfile) -> Value {
        if self.search.is_empty() {
            return Value::Null;
        }
        let pattern = format!("%{}%", escape_like(&self.search));
        let clauses: Vec<Value> = profile
            .search_fields
            .iter()
            .map(|field| json!({ field.to_string(): { "$ilike": pattern } }))
            .collect();
        json!({ "$or": clauses })
    }

    pub fn meta(&self, total: u64) -> PageMeta {
        let limit = self.limit.max(1) as u64;
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + limit - 1) / limit,
            sort_by: self.sort_by.clone(),
            order: self.order.as_str(),
            search: self.search.clone(),
        }
    }
}
