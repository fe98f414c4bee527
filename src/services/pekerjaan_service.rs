use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;

use super::alumni_service::AlumniService;
use super::error::{ServiceError, ServiceResult};
use super::lifecycle::{Lifecycle, RecordState};
use super::pagination::{resolve, ListParams, PageMeta, PEKERJAAN_PROFILE};
use super::policy::{require_admin, Action};
use super::{decode, decode_all, non_blank};
use crate::auth::Identity;
use crate::config::DenialPolicy;
use crate::models::{CreatePekerjaanRequest, Pekerjaan, UpdatePekerjaanRequest};
use crate::schema::Collection;
use crate::store::{Document, Store};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct PekerjaanService {
    lifecycle: Lifecycle,
    alumni: AlumniService,
}

impl PekerjaanService {
    pub fn new(store: Arc<dyn Store>, denial: DenialPolicy) -> Self {
        Self {
            lifecycle: Lifecycle::new(store.clone(), Collection::Pekerjaan, denial, "Pekerjaan"),
            alumni: AlumniService::new(store, denial),
        }
    }

    /// Every visible active job, newest first, with the total.
    pub async fn list_all(&self, identity: &Identity) -> ServiceResult<(Vec<Pekerjaan>, u64)> {
        let listing = self
            .lifecycle
            .list(identity, RecordState::Active, Value::Null, json!(["created_at desc", "id asc"]), None)
            .await?;
        Ok((decode_all(listing.rows)?, listing.total))
    }

    pub async fn list_paginated(&self, identity: &Identity, params: &ListParams) -> ServiceResult<(Vec<Pekerjaan>, PageMeta)> {
        let page = resolve(params, &PEKERJAAN_PROFILE);
        debug!(?page, "resolved pekerjaan page");
        let listing = self
            .lifecycle
            .list(
                identity,
                RecordState::Active,
                page.search_filter(&PEKERJAAN_PROFILE),
                page.order_spec(),
                Some((page.limit as i64, page.offset as i64)),
            )
            .await?;
        Ok((decode_all(listing.rows)?, page.meta(listing.total)))
    }

    pub async fn list_trash(&self, identity: &Identity) -> ServiceResult<Vec<Pekerjaan>> {
        let listing = self
            .lifecycle
            .list(identity, RecordState::Trashed, Value::Null, json!(["deleted_at desc", "id asc"]), None)
            .await?;
        decode_all(listing.rows)
    }

    /// Active job history of one alumni. Admin only.
    pub async fn list_by_alumni(&self, identity: &Identity, alumni_id: i64) -> ServiceResult<Vec<Pekerjaan>> {
        require_admin(identity)?;
        if !self.alumni.exists_active(alumni_id).await? {
            return Err(ServiceError::not_found("Alumni not found"));
        }
        let listing = self
            .lifecycle
            .list(
                identity,
                RecordState::Active,
                json!({ "alumni_id": alumni_id }),
                json!(["tanggal_mulai_kerja desc", "id asc"]),
                None,
            )
            .await?;
        decode_all(listing.rows)
    }

    pub async fn get(&self, identity: &Identity, id: i64) -> ServiceResult<Pekerjaan> {
        decode(self.lifecycle.fetch(identity, id, RecordState::Active, Action::ReadOne).await?)
    }

    pub async fn create(&self, identity: &Identity, request: CreatePekerjaanRequest) -> ServiceResult<Pekerjaan> {
        let mut errors = HashMap::new();
        let mut record = Document::new();

        match request.alumni_id {
            Some(alumni_id) if alumni_id > 0 => {
                record.insert("alumni_id".to_string(), json!(alumni_id));
            }
            _ => {
                errors.insert("alumni_id".to_string(), "alumni_id is required".to_string());
            }
        }
        for (field, value) in [
            ("nama_perusahaan", &request.nama_perusahaan),
            ("posisi_jabatan", &request.posisi_jabatan),
            ("status_pekerjaan", &request.status_pekerjaan),
        ] {
            match non_blank(value) {
                Some(text) => {
                    record.insert(field.to_string(), json!(text));
                }
                None => {
                    errors.insert(field.to_string(), format!("{} is required", field));
                }
            }
        }

        let mulai = match non_blank(&request.tanggal_mulai_kerja) {
            None => {
                errors.insert("tanggal_mulai_kerja".to_string(), "tanggal_mulai_kerja is required".to_string());
                None
            }
            Some(text) => parse_date("tanggal_mulai_kerja", &text, &mut errors),
        };
        let selesai = non_blank(&request.tanggal_selesai_kerja)
            .and_then(|text| parse_date("tanggal_selesai_kerja", &text, &mut errors));
        check_range(mulai, selesai, &mut errors);

        if errors.is_empty() {
            if let Some(alumni_id) = request.alumni_id {
                if !self.alumni.exists_active(alumni_id).await? {
                    errors.insert("alumni_id".to_string(), format!("alumni {} does not exist", alumni_id));
                }
            }
        }
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }

        if let Some(date) = mulai {
            record.insert("tanggal_mulai_kerja".to_string(), json!(date.format(DATE_FORMAT).to_string()));
        }
        if let Some(date) = selesai {
            record.insert("tanggal_selesai_kerja".to_string(), json!(date.format(DATE_FORMAT).to_string()));
        }
        for (field, value) in [
            ("bidang_industri", &request.bidang_industri),
            ("lokasi_kerja", &request.lokasi_kerja),
            ("gaji_range", &request.gaji_range),
            ("deskripsi_pekerjaan", &request.deskripsi_pekerjaan),
        ] {
            if let Some(text) = non_blank(value) {
                record.insert(field.to_string(), json!(text));
            }
        }

        decode(self.lifecycle.create(identity, record).await?)
    }

    /// Merge the patch over the stored job, validate the merged date range,
    /// then write only the changed fields.
    pub async fn update(&self, identity: &Identity, id: i64, request: UpdatePekerjaanRequest) -> ServiceResult<Pekerjaan> {
        let current: Pekerjaan = decode(self.lifecycle.fetch(identity, id, RecordState::Active, Action::Update).await?)?;

        let mut errors = HashMap::new();
        let mut patch = Document::new();

        for (field, value) in [
            ("nama_perusahaan", &request.nama_perusahaan),
            ("posisi_jabatan", &request.posisi_jabatan),
            ("status_pekerjaan", &request.status_pekerjaan),
        ] {
            if value.is_some() {
                match non_blank(value) {
                    Some(text) => {
                        patch.insert(field.to_string(), json!(text));
                    }
                    None => {
                        errors.insert(field.to_string(), format!("{} cannot be empty", field));
                    }
                }
            }
        }
        for (field, value) in [
            ("bidang_industri", &request.bidang_industri),
            ("lokasi_kerja", &request.lokasi_kerja),
            ("gaji_range", &request.gaji_range),
            ("deskripsi_pekerjaan", &request.deskripsi_pekerjaan),
        ] {
            if value.is_some() {
                patch.insert(field.to_string(), non_blank(value).map(Value::String).unwrap_or(Value::Null));
            }
        }

        let mulai = match &request.tanggal_mulai_kerja {
            None => Some(current.tanggal_mulai_kerja),
            Some(text) => parse_date("tanggal_mulai_kerja", text.trim(), &mut errors),
        };
        // An empty end date means "still employed"
        let selesai = match &request.tanggal_selesai_kerja {
            None => current.tanggal_selesai_kerja,
            Some(text) if text.trim().is_empty() => None,
            Some(text) => parse_date("tanggal_selesai_kerja", text.trim(), &mut errors),
        };
        check_range(mulai, selesai, &mut errors);
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }

        if request.tanggal_mulai_kerja.is_some() {
            if let Some(date) = mulai {
                patch.insert("tanggal_mulai_kerja".to_string(), json!(date.format(DATE_FORMAT).to_string()));
            }
        }
        if request.tanggal_selesai_kerja.is_some() {
            let value = selesai.map(|d| json!(d.format(DATE_FORMAT).to_string())).unwrap_or(Value::Null);
            patch.insert("tanggal_selesai_kerja".to_string(), value);
        }

        decode(self.lifecycle.update(identity, id, patch).await?)
    }

    pub async fn soft_delete(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        self.lifecycle.soft_delete(identity, id).await
    }

    pub async fn restore(&self, identity: &Identity, id: i64) -> ServiceResult<Pekerjaan> {
        decode(self.lifecycle.restore(identity, id).await?)
    }

    pub async fn hard_delete(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        self.lifecycle.hard_delete(identity, id).await
    }
}

fn parse_date(field: &str, text: &str, errors: &mut HashMap<String, String>) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(text, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field.to_string(), format!("{} must be a date in YYYY-MM-DD format", field));
            None
        }
    }
}

fn check_range(mulai: Option<NaiveDate>, selesai: Option<NaiveDate>, errors: &mut HashMap<String, String>) {
    if let (Some(start), Some(end)) = (mulai, selesai) {
        if end < start {
            errors.insert(
                "tanggal_selesai_kerja".to_string(),
                "tanggal_selesai_kerja must not be before tanggal_mulai_kerja".to_string(),
            );
        }
    }
}
