use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::middleware::pipeline::{AccessRule, PipelineConfig, SessionPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub api_key_header: String,
    pub protected_prefix: String,
    pub cors_origins: Vec<String>,
    pub cors_max_age_secs: u64,
    pub session_policy: SessionPolicy,
    pub access_rule: AccessRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub store_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_size: u32,
    pub max_size: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let preset = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        // Lazy init cannot fail: an unreadable file is logged and the preset kept
        let base = match env::var("BUDGETKU_CONFIG") {
            Ok(path) => match Self::from_yaml_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("{}", e);
                    preset
                }
            },
            Err(_) => preset,
        };

        base.with_env_overrides()
    }

    /// Load a complete configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("BUDGETKU_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("BUDGETKU_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_API_KEY_HEADER") {
            self.security.api_key_header = v;
        }
        if let Ok(v) = env::var("SECURITY_PROTECTED_PREFIX") {
            self.security.protected_prefix = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_CORS_MAX_AGE_SECS") {
            self.security.cors_max_age_secs = v.parse().unwrap_or(self.security.cors_max_age_secs);
        }
        match env::var("SECURITY_SESSION_POLICY").as_deref() {
            Ok("stateless") => self.security.session_policy = SessionPolicy::Stateless,
            Ok("passthrough") => self.security.session_policy = SessionPolicy::Passthrough,
            _ => {}
        }
        match env::var("SECURITY_ACCESS_RULE").as_deref() {
            Ok("authenticated") => self.security.access_rule = AccessRule::Authenticated,
            Ok("permit_all") => self.security.access_rule = AccessRule::PermitAll,
            _ => {}
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        match env::var("DATABASE_BACKEND").as_deref() {
            Ok("memory") => self.database.backend = StoreBackend::Memory,
            Ok("postgres") => self.database.backend = StoreBackend::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_STORE_TIMEOUT_MS") {
            self.database.store_timeout_ms = v.parse().unwrap_or(self.database.store_timeout_ms);
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_SIZE") {
            self.pagination.default_size = v.parse().unwrap_or(self.pagination.default_size);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_SIZE") {
            self.pagination.max_size = v.parse().unwrap_or(self.pagination.max_size);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            security: SecurityConfig::default(),
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                store_timeout_ms: 5_000,
            },
            pagination: PaginationConfig {
                default_size: 10,
                max_size: 100,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            security: SecurityConfig::default(),
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                store_timeout_ms: 3_000,
            },
            pagination: PaginationConfig {
                default_size: 10,
                max_size: 100,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            security: SecurityConfig::default(),
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                store_timeout_ms: 2_000,
            },
            pagination: PaginationConfig {
                default_size: 10,
                max_size: 50,
            },
        }
    }

    /// Pipeline settings consumed by `build_pipeline`.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            api_key_header: self.security.api_key_header.clone(),
            protected_prefix: self.security.protected_prefix.clone(),
            cors: crate::middleware::cors::CorsPolicy {
                allowed_origins: self.security.cors_origins.clone(),
                max_age: Duration::from_secs(self.security.cors_max_age_secs),
                ..Default::default()
            },
            session_policy: self.security.session_policy,
            access_rule: self.security.access_rule,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.database.store_timeout_ms)
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key_header: "x-api-key".to_string(),
            protected_prefix: "/api/v1".to_string(),
            cors_origins: vec!["*".to_string()],
            cors_max_age_secs: 10,
            session_policy: SessionPolicy::Stateless,
            access_rule: AccessRule::Authenticated,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
