// handlers/public/auth/login.rs - POST /api/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{LoginRequest, LoginResponse};

/// POST /api/login - exchange username (or email) and password for a JWT
///
/// Unknown users and wrong passwords produce the same 401 so the response
/// does not reveal which accounts exist.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let response = state.users.login(&request, &state.config.security).await?;
    Ok(ApiResponse::success(response).with_message("Login successful"))
}
