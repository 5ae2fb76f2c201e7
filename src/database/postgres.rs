use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::PageRequest;
use crate::database::manager::DatabaseError;
use crate::database::models::{ApiKeyRecord, User, Wallet};
use crate::database::stores::{ApiKeyStore, StoreHealth, UserStore, WalletStore};

/// Postgres-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, full_name, email, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_api_key(&self, record: &ApiKeyRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, key_hash, owner_id, revoked, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.key_hash)
        .bind(record.owner_id)
        .bind(record.revoked)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn revoke_api_key(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE api_keys SET revoked = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("API key {id}")));
        }
        Ok(())
    }

    pub async fn list_api_keys(&self, owner_id: Uuid) -> Result<Vec<ApiKeyRecord>, DatabaseError> {
        let keys = sqlx::query_as::<_, ApiKeyRecord>(
            r#"
            SELECT id, name, key_hash, owner_id, revoked, expires_at, created_at
            FROM api_keys
            WHERE owner_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }
}

#[async_trait]
impl ApiKeyStore for PgStore {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(
            r#"
            SELECT id, name, key_hash, owner_id, revoked, expires_at, created_at
            FROM api_keys
            WHERE key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn find_page_by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<(Vec<Wallet>, i64), DatabaseError> {
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        // Page and count must come from the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let items = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, owner_id, name, amount, currency, created_at, updated_at
            FROM wallets
            WHERE owner_id = $1
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(i64::from(page.size()))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((items, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Wallet>, DatabaseError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            "SELECT id, owner_id, name, amount, currency, created_at, updated_at FROM wallets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(wallet)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
