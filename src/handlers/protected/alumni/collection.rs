use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Alumni, CreateAlumniRequest};
use crate::services::pagination::ListParams;

/// GET /api/alumni - paginated, searchable listing
pub async fn alumni_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Alumni>> {
    let Query(params) = query?;
    let (rows, meta) = state.alumni.list(&identity, &params).await?;
    Ok(ApiResponse::success(rows).with_meta(meta))
}

/// GET /api/alumni/trash - soft-deleted alumni visible to the caller
pub async fn alumni_trash(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Alumni>> {
    let rows = state.alumni.list_trash(&identity).await?;
    let count = rows.len() as u64;
    Ok(ApiResponse::success(rows).with_count(count))
}

/// POST /api/alumni
pub async fn alumni_create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateAlumniRequest>, JsonRejection>,
) -> ApiResult<Alumni> {
    let Json(request) = payload?;
    let created = state.alumni.create(&identity, request).await?;
    Ok(ApiResponse::created(created).with_message("Alumni created"))
}
