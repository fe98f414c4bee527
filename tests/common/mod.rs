#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use alumni_api::app::{app, AppState};
use alumni_api::auth::Role;
use alumni_api::config::{AppConfig, DenialPolicy, Environment};
use alumni_api::services::UserService;
use alumni_api::store::{MemoryStore, Store};

pub const PASSWORD: &str = "rahasia123";

/// The full router over a fresh in-memory store with three seeded accounts.
pub struct TestApp {
    pub router: Router,
    pub admin_token: String,
    pub alice_token: String,
    pub bob_token: String,
    pub alice_id: i64,
    pub bob_id: i64,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_denial(DenialPolicy::NotFound).await
    }

    pub async fn with_denial(denial: DenialPolicy) -> Result<Self> {
        let mut config = AppConfig::defaults(Environment::Development);
        config.security.ownership_denial = denial;
        config.api.enable_request_logging = false;

        let store: std::sync::Arc<dyn Store> = std::sync::Arc::new(MemoryStore::new());
        let users = UserService::new(store.clone());
        // Low bcrypt cost keeps the suite fast
        let hash = bcrypt::hash(PASSWORD, 4)?;
        users.create_user("admin", "admin@example.com", &hash, Role::Admin).await?;
        let alice = users.create_user("alice", "alice@example.com", &hash, Role::User).await?;
        let bob = users.create_user("bob", "bob@example.com", &hash, Role::User).await?;

        let router = app(AppState::new(store, config));
        let mut test_app = Self {
            router,
            admin_token: String::new(),
            alice_token: String::new(),
            bob_token: String::new(),
            alice_id: alice.id,
            bob_id: bob.id,
        };
        test_app.admin_token = test_app.login("admin").await?;
        test_app.alice_token = test_app.login("alice").await?;
        test_app.bob_token = test_app.login("bob").await?;
        Ok(test_app)
    }

    pub async fn login(&self, username: &str) -> Result<String> {
        let (status, body) = self
            .send(Method::POST, "/api/login", None, Some(json!({"username": username, "password": PASSWORD})))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login for {} failed: {} {}", username, status, body);
        body["data"]["token"].as_str().map(str::to_string).context("token missing from login response")
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn create_alumni(&self, token: &str, nim: &str, nama: &str) -> Result<i64> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/alumni",
                Some(token),
                Some(json!({
                    "nim": nim,
                    "nama": nama,
                    "jurusan": "Teknik Informatika",
                    "angkatan": 2017,
                    "tahun_lulus": 2021,
                    "email": format!("{}@example.com", nim),
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create alumni failed: {} {}", status, body);
        body["data"]["id"].as_i64().context("alumni id missing")
    }

    pub async fn create_job(&self, token: &str, alumni_id: i64, perusahaan: &str, mulai: &str) -> Result<i64> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/pekerjaan",
                Some(token),
                Some(json!({
                    "alumni_id": alumni_id,
                    "nama_perusahaan": perusahaan,
                    "posisi_jabatan": "Software Engineer",
                    "bidang_industri": "Teknologi",
                    "tanggal_mulai_kerja": mulai,
                    "status_pekerjaan": "aktif",
                })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create pekerjaan failed: {} {}", status, body);
        body["data"]["id"].as_i64().context("pekerjaan id missing")
    }
}
