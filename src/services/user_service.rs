use std::sync::Arc;

use serde_json::json;
use tokio::task;
use tracing::{info, warn};

use super::decode;
use super::error::{ServiceError, ServiceResult};
use super::lifecycle::now_timestamp;
use crate::auth::{generate_jwt, hash_password, verify_password, Claims, Role};
use crate::config::SecurityConfig;
use crate::models::{LoginRequest, LoginResponse, User, UserProfile};
use crate::schema::Collection;
use crate::store::{Document, Store};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Look a user up by username, falling back to email.
    pub async fn find_by_login(&self, login: &str) -> ServiceResult<Option<User>> {
        for field in ["username", "email"] {
            if let Some(doc) = self.store.find_one(Collection::Users, &json!({ field: login })).await? {
                return Ok(Some(decode(doc)?));
            }
        }
        Ok(None)
    }

    pub async fn login(&self, request: &LoginRequest, security: &SecurityConfig) -> ServiceResult<LoginResponse> {
        let login = request.username.trim();
        if login.is_empty() || request.password.is_empty() {
            return Err(ServiceError::validation("username and password are required"));
        }

        let user = match self.find_by_login(login).await? {
            Some(user) if password_matches(&request.password, &user.password_hash).await? => user,
            _ => {
                warn!(login, "login rejected");
                return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
            }
        };

        let claims = Claims::new(user.id, user.username.clone(), user.role, security.jwt_expiry_hours);
        let token = generate_jwt(&claims, &security.jwt_secret)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        info!(user_id = user.id, role = user.role.as_str(), "login succeeded");
        Ok(LoginResponse {
            token,
            user: UserProfile::from(&user),
            expires_in: security.jwt_expiry_hours * 3600,
        })
    }

    /// Insert a user with an already-hashed password.
    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str, role: Role) -> ServiceResult<User> {
        let mut record = Document::new();
        record.insert("username".to_string(), json!(username));
        record.insert("email".to_string(), json!(email));
        record.insert("password_hash".to_string(), json!(password_hash));
        record.insert("role".to_string(), json!(role.as_str()));
        record.insert("created_at".to_string(), now_timestamp());

        let id = self.store.insert(Collection::Users, record).await?;
        let doc = self
            .store
            .find_one(Collection::Users, &json!({ "id": id }))
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        decode(doc)
    }

    /// Create the bootstrap admin account unless that username already exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> ServiceResult<()> {
        if self.find_by_login(username).await?.is_some() {
            return Ok(());
        }
        let password = password.to_string();
        let hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(format!("password hashing task failed: {}", e)))?
            .map_err(|e| ServiceError::Internal(format!("cannot hash seed password: {}", e)))?;
        let user = self
            .create_user(username, &format!("{}@localhost", username), &hash, Role::Admin)
            .await?;
        info!(user_id = user.id, username, "seeded admin account");
        Ok(())
    }
}

/// bcrypt is CPU-bound, so it runs off the async workers.
async fn password_matches(password: &str, password_hash: &str) -> ServiceResult<bool> {
    let (password, password_hash) = (password.to_string(), password_hash.to_string());
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("password verification task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_store;
    use crate::auth::validate_jwt;
    use crate::config::{AppConfig, Environment};

    async fn service_with_user() -> (UserService, SecurityConfig) {
        let svc = UserService::new(memory_store());
        let hash = bcrypt::hash("rahasia", 4).unwrap();
        svc.create_user("rina", "rina@example.com", &hash, Role::User).await.unwrap();
        (svc, AppConfig::defaults(Environment::Development).security)
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let (svc, security) = service_with_user().await;
        for login in ["rina", "rina@example.com"] {
            let response = svc
                .login(&LoginRequest { username: login.to_string(), password: "rahasia".to_string() }, &security)
                .await
                .unwrap();
            let claims = validate_jwt(&response.token, &security.jwt_secret).unwrap();
            assert_eq!(claims.username, "rina");
            assert_eq!(response.expires_in, security.jwt_expiry_hours * 3600);
        }
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let (svc, security) = service_with_user().await;
        let wrong_password = svc
            .login(&LoginRequest { username: "rina".to_string(), password: "salah".to_string() }, &security)
            .await
            .unwrap_err();
        let unknown_user = svc
            .login(&LoginRequest { username: "nobody".to_string(), password: "rahasia".to_string() }, &security)
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, ServiceError::Unauthenticated(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_logins_all_verify() {
        let (svc, security) = service_with_user().await;
        let attempts = (0..8).map(|i| {
            let (svc, security) = (svc.clone(), security.clone());
            let password = if i % 2 == 0 { "rahasia" } else { "salah" };
            tokio::spawn(async move {
                svc.login(&LoginRequest { username: "rina".to_string(), password: password.to_string() }, &security)
                    .await
                    .is_ok()
            })
        });
        let mut outcomes = Vec::new();
        for attempt in attempts.collect::<Vec<_>>() {
            outcomes.push(attempt.await.unwrap());
        }
        assert_eq!(outcomes, vec![true, false, true, false, true, false, true, false]);
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let svc = UserService::new(memory_store());
        svc.ensure_admin("root", "pw").await.unwrap();
        svc.ensure_admin("root", "pw").await.unwrap();
        let user = svc.find_by_login("root").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}
