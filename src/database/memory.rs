use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::PageRequest;
use crate::database::manager::DatabaseError;
use crate::database::models::{generate_key, ApiKeyRecord, User, Wallet};
use crate::database::stores::{ApiKeyStore, StoreHealth, UserStore, WalletStore};

/// Process-local store used by tests and the development profile.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    wallets: RwLock<HashMap<Uuid, Wallet>>,
    api_keys: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_wallet(&self, wallet: Wallet) {
        self.wallets.write().await.insert(wallet.id, wallet);
    }

    pub async fn insert_api_key(&self, record: ApiKeyRecord) {
        self.api_keys.write().await.insert(record.key_hash.clone(), record);
    }

    /// Returns false when no key has that id
    pub async fn revoke_api_key(&self, id: Uuid) -> bool {
        let mut keys = self.api_keys.write().await;
        match keys.values_mut().find(|k| k.id == id) {
            Some(record) => {
                record.revoked = true;
                true
            }
            None => false,
        }
    }

    /// Seed a demo user with a few wallets and a fresh key; returns the raw key.
    pub async fn seed_demo(&self) -> (User, String) {
        let user = User::new("Demo User", "demo@budgetku.local");
        for (name, cents) in [("Cash", 15_000_000i64), ("Bank", 250_000_000), ("E-Wallet", 7_500_000)] {
            self.insert_wallet(Wallet::new(user.id, name, Decimal::new(cents, 2), "IDR")).await;
        }
        let raw_key = generate_key();
        self.insert_api_key(ApiKeyRecord::new("demo", &raw_key, user.id, None)).await;
        self.insert_user(user.clone()).await;
        (user, raw_key)
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DatabaseError> {
        Ok(self.api_keys.read().await.get(key_hash).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn find_page_by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<(Vec<Wallet>, i64), DatabaseError> {
        let wallets = self.wallets.read().await;
        let mut owned: Vec<&Wallet> = wallets.values().filter(|w| w.owner_id == owner_id).collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = i64::try_from(owned.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = owned
            .into_iter()
            .skip(offset)
            .take(page.size() as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Wallet>, DatabaseError> {
        Ok(self.wallets.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
