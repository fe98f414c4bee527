use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::super::utils::parse_id;
use crate::app::AppState;
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Alumni, UpdateAlumniRequest};

/// GET /api/alumni/:id
pub async fn alumni_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Alumni> {
    let id = parse_id(&id, "alumni")?;
    Ok(ApiResponse::success(state.alumni.get(&identity, id).await?))
}

/// PUT /api/alumni/:id - partial update of an active record
pub async fn alumni_update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAlumniRequest>, JsonRejection>,
) -> ApiResult<Alumni> {
    let id = parse_id(&id, "alumni")?;
    let Json(request) = payload?;
    let updated = state.alumni.update(&identity, id, request).await?;
    Ok(ApiResponse::success(updated).with_message("Alumni updated"))
}

/// DELETE /api/alumni/:id - soft delete
pub async fn alumni_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "alumni")?;
    state.alumni.soft_delete(&identity, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Alumni moved to trash"))
}

/// PUT /api/alumni/restore/:id
pub async fn alumni_restore(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Alumni> {
    let id = parse_id(&id, "alumni")?;
    let restored = state.alumni.restore(&identity, id).await?;
    Ok(ApiResponse::success(restored).with_message("Alumni restored"))
}
