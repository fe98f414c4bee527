// /api/alumni-pekerjaan - joined alumni and job reports

use axum::{
    extract::{Path, State},
    Extension,
};

use crate::app::AppState;
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{AlumniJobReport, AlumniWithPekerjaan};

/// GET /api/alumni-pekerjaan
pub async fn alumni_pekerjaan_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<AlumniWithPekerjaan>> {
    let rows = state.reports.alumni_with_pekerjaan(&identity).await?;
    let count = rows.len() as u64;
    Ok(ApiResponse::success(rows).with_count(count))
}

/// GET /api/alumni-pekerjaan/status/:status - jobs in a status held for over a year
pub async fn alumni_pekerjaan_by_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(status): Path<String>,
) -> ApiResult<Vec<AlumniJobReport>> {
    let (rows, count) = state.reports.by_status(&identity, status.trim()).await?;
    Ok(ApiResponse::success(rows).with_count(count))
}

/// GET /api/alumni-pekerjaan/long-term
pub async fn alumni_pekerjaan_long_term(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<AlumniJobReport>> {
    let (rows, count) = state.reports.long_term(&identity).await?;
    Ok(ApiResponse::success(rows).with_count(count))
}
