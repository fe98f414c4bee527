//! Read-only reports joining alumni with their jobs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use serde_json::json;
use tracing::debug;

use super::error::ServiceResult;
use super::lifecycle::RecordState;
use super::policy::{authorize, Action};
use super::{decode, decode_all};
use crate::auth::Identity;
use crate::filter::FilterData;
use crate::models::{Alumni, AlumniJobReport, AlumniWithPekerjaan, Pekerjaan};
use crate::schema::Collection;
use crate::store::{and_filters, Store};

/// Status counted as current employment by the long-term report
pub const ACTIVE_STATUS: &str = "aktif";

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Visible active alumni, each with their visible active jobs.
    pub async fn alumni_with_pekerjaan(&self, identity: &Identity) -> ServiceResult<Vec<AlumniWithPekerjaan>> {
        let scope = authorize(identity, Action::ReadList, None)?.scope_filter();
        let active = RecordState::Active.predicate();
        let alumni_filter = and_filters([active.clone(), scope.clone()]);
        let job_filter = and_filters([active, scope]);

        let rows = self.store.alumni_with_pekerjaan(&alumni_filter, &job_filter).await?;
        decode_all(rows)
    }

    /// Jobs in `status` held for more than a year, joined with their alumni.
    /// Returns the rows plus their count.
    pub async fn by_status(&self, identity: &Identity, status: &str) -> ServiceResult<(Vec<AlumniJobReport>, u64)> {
        self.by_status_on(identity, status, Utc::now().date_naive()).await
    }

    pub async fn long_term(&self, identity: &Identity) -> ServiceResult<(Vec<AlumniJobReport>, u64)> {
        self.by_status(identity, ACTIVE_STATUS).await
    }

    async fn by_status_on(&self, identity: &Identity, status: &str, today: NaiveDate) -> ServiceResult<(Vec<AlumniJobReport>, u64)> {
        let scope = authorize(identity, Action::ReadList, None)?.scope_filter();
        let cutoff = today.checked_sub_months(Months::new(12)).unwrap_or(today);
        debug!(status, %cutoff, "tenure report");

        let job_filter = and_filters([
            RecordState::Active.predicate(),
            scope,
            json!({ "status_pekerjaan": status }),
            json!({ "tanggal_mulai_kerja": { "$lt": cutoff.format("%Y-%m-%d").to_string() } }),
        ]);
        let jobs: Vec<Pekerjaan> = decode_all(
            self.store
                .find(Collection::Pekerjaan, &FilterData::matching(job_filter).order_by(json!(["alumni_id asc", "id asc"])))
                .await?,
        )?;
        if jobs.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let mut alumni_ids: Vec<i64> = jobs.iter().map(|j| j.alumni_id).collect();
        alumni_ids.dedup();
        let alumni_filter = and_filters([RecordState::Active.predicate(), json!({ "id": { "$in": alumni_ids } })]);
        let alumni: HashMap<i64, Alumni> = self
            .store
            .find(Collection::Alumni, &FilterData::matching(alumni_filter))
            .await?
            .into_iter()
            .map(decode::<Alumni>)
            .map(|a| a.map(|a| (a.id, a)))
            .collect::<ServiceResult<_>>()?;

        // Jobs whose alumni is trashed drop out of the report
        let rows: Vec<AlumniJobReport> = jobs
            .into_iter()
            .filter_map(|job| alumni.get(&job.alumni_id).map(|a| report_row(a, job, today)))
            .collect();
        let count = rows.len() as u64;
        Ok((rows, count))
    }
}

fn report_row(alumni: &Alumni, job: Pekerjaan, today: NaiveDate) -> AlumniJobReport {
    AlumniJobReport {
        alumni_id: alumni.id,
        nim: alumni.nim.clone(),
        nama: alumni.nama.clone(),
        jurusan: alumni.jurusan.clone(),
        angkatan: alumni.angkatan,
        pekerjaan_id: job.id,
        nama_perusahaan: job.nama_perusahaan,
        posisi_jabatan: job.posisi_jabatan,
        bidang_industri: job.bidang_industri,
        gaji_range: job.gaji_range,
        tanggal_mulai_kerja: job.tanggal_mulai_kerja,
        status_pekerjaan: job.status_pekerjaan,
        lama_bekerja_hari: (today - job.tanggal_mulai_kerja).num_days(),
    }
}
