use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pekerjaan {
    pub id: i64,
    pub alumni_id: i64,
    pub nama_perusahaan: String,
    pub posisi_jabatan: String,
    pub bidang_industri: Option<String>,
    pub lokasi_kerja: Option<String>,
    pub gaji_range: Option<String>,
    pub tanggal_mulai_kerja: NaiveDate,
    /// Absent while still employed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tanggal_selesai_kerja: Option<NaiveDate>,
    pub status_pekerjaan: String,
    pub deskripsi_pekerjaan: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Dates arrive as `YYYY-MM-DD` strings and are parsed by the service so
/// that bad input becomes a field error rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePekerjaanRequest {
    pub alumni_id: Option<i64>,
    pub nama_perusahaan: Option<String>,
    pub posisi_jabatan: Option<String>,
    pub bidang_industri: Option<String>,
    pub lokasi_kerja: Option<String>,
    pub gaji_range: Option<String>,
    pub tanggal_mulai_kerja: Option<String>,
    pub tanggal_selesai_kerja: Option<String>,
    pub status_pekerjaan: Option<String>,
    pub deskripsi_pekerjaan: Option<String>,
}

/// Partial update. An empty `tanggal_selesai_kerja` clears the end date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePekerjaanRequest {
    pub nama_perusahaan: Option<String>,
    pub posisi_jabatan: Option<String>,
    pub bidang_industri: Option<String>,
    pub lokasi_kerja: Option<String>,
    pub gaji_range: Option<String>,
    pub tanggal_mulai_kerja: Option<String>,
    pub tanggal_selesai_kerja: Option<String>,
    pub status_pekerjaan: Option<String>,
    pub deskripsi_pekerjaan: Option<String>,
}
