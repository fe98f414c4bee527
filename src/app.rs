use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AlumniService, PekerjaanService, ReportService, UserService};
use crate::store::Store;

/// Shared state injected into every handler. The store is built once at
/// startup and every service shares it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub alumni: AlumniService,
    pub pekerjaan: PekerjaanService,
    pub reports: ReportService,
    pub users: UserService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let denial = config.security.ownership_denial;
        Self {
            alumni: AlumniService::new(store.clone(), denial),
            pekerjaan: PekerjaanService::new(store.clone(), denial),
            reports: ReportService::new(store.clone()),
            users: UserService::new(store.clone()),
            config: Arc::new(config),
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/api/login", post(public::auth::login_post))
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    let router = if state.config.security.enable_cors {
        router.layer(cors_layer(&state.config.security))
    } else {
        router
    };

    router.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(alumni_routes())
        .merge(pekerjaan_routes())
        .merge(report_routes())
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn alumni_routes() -> Router<AppState> {
    use protected::alumni;

    Router::new()
        .route("/api/alumni", get(alumni::alumni_list).post(alumni::alumni_create))
        .route("/api/alumni/trash", get(alumni::alumni_trash))
        .route("/api/alumni/restore/:id", put(alumni::alumni_restore))
        .route(
            "/api/alumni/:id",
            get(alumni::alumni_get)
                .put(alumni::alumni_update)
                .delete(alumni::alumni_delete),
        )
}

fn pekerjaan_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::pekerjaan;

    Router::new()
        .route("/api/pekerjaan", get(pekerjaan::pekerjaan_list).post(pekerjaan::pekerjaan_create))
        .route("/api/pekerjaan/paginated", get(pekerjaan::pekerjaan_paginated))
        .route("/api/pekerjaan/trash", get(pekerjaan::pekerjaan_trash))
        .route("/api/pekerjaan/alumni/:alumni_id", get(pekerjaan::pekerjaan_by_alumni))
        .route(
            "/api/pekerjaan/restore/:id",
            put(pekerjaan::pekerjaan_restore).post(pekerjaan::pekerjaan_restore),
        )
        .route("/api/pekerjaan/hard-delete/:id", delete(pekerjaan::pekerjaan_hard_delete))
        .route(
            "/api/pekerjaan/:id",
            get(pekerjaan::pekerjaan_get)
                .put(pekerjaan::pekerjaan_update)
                .delete(pekerjaan::pekerjaan_delete),
        )
}

fn report_routes() -> Router<AppState> {
    use protected::alumni_pekerjaan as reports;

    Router::new()
        .route("/api/alumni-pekerjaan", get(reports::alumni_pekerjaan_list))
        .route("/api/alumni-pekerjaan/status/:status", get(reports::alumni_pekerjaan_by_status))
        .route("/api/alumni-pekerjaan/long-term", get(reports::alumni_pekerjaan_long_term))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}
