use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alumni {
    pub id: i64,
    pub nim: String,
    pub nama: String,
    pub jurusan: String,
    pub angkatan: Option<i32>,
    pub tahun_lulus: Option<i32>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_telepon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alamat: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only on trashed records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAlumniRequest {
    pub nim: Option<String>,
    pub nama: Option<String>,
    pub jurusan: Option<String>,
    pub angkatan: Option<i32>,
    pub tahun_lulus: Option<i32>,
    pub email: Option<String>,
    pub no_telepon: Option<String>,
    pub alamat: Option<String>,
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAlumniRequest {
    pub nama: Option<String>,
    pub jurusan: Option<String>,
    pub angkatan: Option<i32>,
    pub tahun_lulus: Option<i32>,
    pub email: Option<String>,
    pub no_telepon: Option<String>,
    pub alamat: Option<String>,
}
