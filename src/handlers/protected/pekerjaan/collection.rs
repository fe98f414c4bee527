use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};

use super::super::utils::parse_id;
use crate::app::AppState;
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{CreatePekerjaanRequest, Pekerjaan};
use crate::services::pagination::ListParams;

/// GET /api/pekerjaan - every visible active job with a count
pub async fn pekerjaan_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Pekerjaan>> {
    let (rows, count) = state.pekerjaan.list_all(&identity).await?;
    Ok(ApiResponse::success(rows).with_count(count))
}

/// GET /api/pekerjaan/paginated
pub async fn pekerjaan_paginated(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Pekerjaan>> {
    let Query(params) = query?;
    let (rows, meta) = state.pekerjaan.list_paginated(&identity, &params).await?;
    Ok(ApiResponse::success(rows).with_meta(meta))
}

/// GET /api/pekerjaan/trash
pub async fn pekerjaan_trash(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Pekerjaan>> {
    let rows = state.pekerjaan.list_trash(&identity).await?;
    let count = rows.len() as u64;
    Ok(ApiResponse::success(rows).with_count(count))
}

/// GET /api/pekerjaan/alumni/:alumni_id - admin only
pub async fn pekerjaan_by_alumni(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(alumni_id): Path<String>,
) -> ApiResult<Vec<Pekerjaan>> {
    let alumni_id = parse_id(&alumni_id, "alumni")?;
    let rows = state.pekerjaan.list_by_alumni(&identity, alumni_id).await?;
    let count = rows.len() as u64;
    Ok(ApiResponse::success(rows).with_count(count))
}

/// POST /api/pekerjaan
pub async fn pekerjaan_create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreatePekerjaanRequest>, JsonRejection>,
) -> ApiResult<Pekerjaan> {
    let Json(request) = payload?;
    let created = state.pekerjaan.create(&identity, request).await?;
    Ok(ApiResponse::created(created).with_message("Pekerjaan created"))
}
