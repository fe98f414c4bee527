use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::super::utils::parse_id;
use crate::app::AppState;
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Pekerjaan, UpdatePekerjaanRequest};

/// GET /api/pekerjaan/:id
pub async fn pekerjaan_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Pekerjaan> {
    let id = parse_id(&id, "pekerjaan")?;
    Ok(ApiResponse::success(state.pekerjaan.get(&identity, id).await?))
}

/// PUT /api/pekerjaan/:id
pub async fn pekerjaan_update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePekerjaanRequest>, JsonRejection>,
) -> ApiResult<Pekerjaan> {
    let id = parse_id(&id, "pekerjaan")?;
    let Json(request) = payload?;
    let updated = state.pekerjaan.update(&identity, id, request).await?;
    Ok(ApiResponse::success(updated).with_message("Pekerjaan updated"))
}

/// DELETE /api/pekerjaan/:id - soft delete
pub async fn pekerjaan_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "pekerjaan")?;
    state.pekerjaan.soft_delete(&identity, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Pekerjaan moved to trash"))
}

/// PUT|POST /api/pekerjaan/restore/:id
pub async fn pekerjaan_restore(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Pekerjaan> {
    let id = parse_id(&id, "pekerjaan")?;
    let restored = state.pekerjaan.restore(&identity, id).await?;
    Ok(ApiResponse::success(restored).with_message("Pekerjaan restored"))
}

/// DELETE /api/pekerjaan/hard-delete/:id - purge a trashed record
pub async fn pekerjaan_hard_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "pekerjaan")?;
    state.pekerjaan.hard_delete(&identity, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message(format!("Pekerjaan {} permanently deleted", id)))
}
