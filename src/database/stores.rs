use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::PageRequest;
use crate::database::manager::DatabaseError;
use crate::database::models::{ApiKeyRecord, User, Wallet};

/// Read-only lookup of API keys by their hash
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    /// One page of an owner's wallets ordered by `created_at, id`, plus the owner's total wallet count.
    async fn find_page_by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<(Vec<Wallet>, i64), DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Wallet>, DatabaseError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// The stores shared by every request handler
#[derive(Clone)]
pub struct Stores {
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub users: Arc<dyn UserStore>,
    pub wallets: Arc<dyn WalletStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Stores {
    /// All four roles served by one backend
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ApiKeyStore + UserStore + WalletStore + StoreHealth + 'static,
    {
        Self {
            api_keys: backend.clone(),
            users: backend.clone(),
            wallets: backend.clone(),
            health: backend,
        }
    }
}
