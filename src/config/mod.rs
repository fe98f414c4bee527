use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Mongodb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}' (expected postgres, mongodb or memory)", other)),
        }
    }
}

/// How an ownership denial on a single record is reported to non-admin callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialPolicy {
    NotFound,
    Forbidden,
}

impl FromStr for DenialPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_found" | "404" => Ok(DenialPolicy::NotFound),
            "forbidden" | "403" => Ok(DenialPolicy::Forbidden),
            other => Err(format!("unknown denial policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub operation_timeout_ms: u64,
    pub run_migrations: bool,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub seed_admin_username: Option<String>,
    pub seed_admin_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub ownership_denial: DenialPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::defaults(environment).with_env_overrides()
    }

    pub fn defaults(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup; `from_env` passes the process environment.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Store overrides
        if let Some(v) = lookup("DB_TYPE") {
            self.store.backend = v.parse().unwrap_or(self.store.backend);
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout_secs = v.parse().unwrap_or(self.store.connection_timeout_secs);
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.store.run_migrations = v.parse().unwrap_or(self.store.run_migrations);
        }
        if let Some(v) = lookup("STORE_OPERATION_TIMEOUT_MS") {
            self.store.operation_timeout_ms = v.parse().unwrap_or(self.store.operation_timeout_ms);
        }
        if let Some(v) = lookup("MONGO_URI") {
            self.store.mongo_uri = Some(v);
        }
        if let Some(v) = lookup("MONGO_DATABASE") {
            self.store.mongo_database = v;
        }
        if let Some(v) = lookup("SEED_ADMIN_USERNAME") {
            self.store.seed_admin_username = Some(v);
        }
        if let Some(v) = lookup("SEED_ADMIN_PASSWORD") {
            self.store.seed_admin_password = Some(v);
        }

        // API overrides
        if let Some(v) = lookup("API_PORT").or_else(|| lookup("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("OWNERSHIP_DENIAL") {
            self.security.ownership_denial = v.parse().unwrap_or(self.security.ownership_denial);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 10,
                connection_timeout_secs: 30,
                operation_timeout_ms: 5_000,
                run_migrations: true,
                mongo_uri: None,
                mongo_database: "alumni".to_string(),
                seed_admin_username: None,
                seed_admin_password: None,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24,
                ownership_denial: DenialPolicy::NotFound,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 20,
                connection_timeout_secs: 10,
                operation_timeout_ms: 5_000,
                run_migrations: true,
                mongo_uri: None,
                mongo_database: "alumni".to_string(),
                seed_admin_username: None,
                seed_admin_password: None,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                ownership_denial: DenialPolicy::NotFound,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 50,
                connection_timeout_secs: 5,
                operation_timeout_ms: 3_000,
                run_migrations: false,
                mongo_uri: None,
                mongo_database: "alumni".to_string(),
                seed_admin_username: None,
                seed_admin_password: None,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                ownership_denial: DenialPolicy::NotFound,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert!(config.store.run_migrations);
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.store.run_migrations);
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.ownership_denial, DenialPolicy::NotFound);
    }

    #[test]
    fn overrides_select_backend_and_denial_policy() {
        let config = AppConfig::development().with_overrides(lookup(&[
            ("DB_TYPE", "mongodb"),
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("OWNERSHIP_DENIAL", "forbidden"),
            ("PORT", "8080"),
        ]));
        assert_eq!(config.store.backend, StoreBackend::Mongodb);
        assert_eq!(config.store.mongo_uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(config.security.ownership_denial, DenialPolicy::Forbidden);
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn unparseable_overrides_keep_defaults() {
        let config = AppConfig::development().with_overrides(lookup(&[
            ("DB_TYPE", "oracle"),
            ("STORE_OPERATION_TIMEOUT_MS", "soon"),
        ]));
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.operation_timeout_ms, 5_000);
    }
}
