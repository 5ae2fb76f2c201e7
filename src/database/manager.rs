use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Bound a store call by `limit`; an elapsed deadline becomes `DatabaseError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DatabaseError::Timeout(limit)),
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS api_keys (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        key_hash TEXT NOT NULL UNIQUE,
        owner_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        revoked BOOLEAN NOT NULL DEFAULT false,
        expires_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wallets (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
        currency TEXT NOT NULL DEFAULT 'IDR',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS wallets_owner_created_idx ON wallets (owner_id, created_at, id)",
];

/// Owns the Postgres pool for the process
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let redacted = redact_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", redacted);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Strip credentials from a connection string so it can be logged.
pub fn redact_url(raw: &str) -> Result<String, DatabaseError> {
    let mut url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    if url.password().is_some() {
        url.set_password(Some("***")).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    }
    Ok(url.into())
}
