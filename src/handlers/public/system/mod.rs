// handlers/public/system - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Alumni API",
            "version": version,
            "description": "Alumni and employment history tracking backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "POST /api/login (public - token acquisition)",
                "alumni": "/api/alumni[/:id], /api/alumni/trash, /api/alumni/restore/:id (protected)",
                "pekerjaan": "/api/pekerjaan[/:id], /api/pekerjaan/paginated, /api/pekerjaan/trash, /api/pekerjaan/restore/:id, /api/pekerjaan/hard-delete/:id (protected)",
                "pekerjaan_by_alumni": "/api/pekerjaan/alumni/:alumni_id (admin)",
                "reports": "/api/alumni-pekerjaan, /api/alumni-pekerjaan/status/:status, /api/alumni-pekerjaan/long-term (protected)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": backend
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store": backend
                    }
                })),
            )
        }
    }
}
