use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Alumni, Pekerjaan};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlumniWithPekerjaan {
    #[serde(flatten)]
    pub alumni: Alumni,
    pub pekerjaan: Vec<Pekerjaan>,
}

/// One job held for more than a year, joined with its alumni.
#[derive(Debug, Clone, Serialize)]
pub struct AlumniJobReport {
    pub alumni_id: i64,
    pub nim: String,
    pub nama: String,
    pub jurusan: String,
    pub angkatan: Option<i32>,
    pub pekerjaan_id: i64,
    pub nama_perusahaan: String,
    pub posisi_jabatan: String,
    pub bidang_industri: Option<String>,
    pub gaji_range: Option<String>,
    pub tanggal_mulai_kerja: NaiveDate,
    pub status_pekerjaan: String,
    pub lama_bekerja_hari: i64,
}
