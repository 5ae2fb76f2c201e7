use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// Prefix on every issued key, so leaked keys are easy to grep for.
pub const KEY_PREFIX: &str = "bk_";
const KEY_RANDOM_LEN: usize = 40;

/// A persisted API key. Only the SHA-256 of the raw key is stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub owner_id: Uuid,
    pub revoked: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// Build a record for `raw_key` without persisting it
    pub fn new(name: impl Into<String>, raw_key: &str, owner_id: Uuid, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            key_hash: hash_key(raw_key),
            owner_id,
            revoked: false,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }
}

/// Hex SHA-256 of a raw key
pub fn hash_key(raw_key: &str) -> String {
    format!("{:x}", Sha256::digest(raw_key.as_bytes()))
}

/// Fresh random key, e.g. `bk_3fQ...`
pub fn generate_key() -> String {
    let random: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{KEY_PREFIX}{random}")
}
