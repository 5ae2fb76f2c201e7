use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::api::{PageRequest, PageResult};
use crate::database::models::WalletResponse;
use crate::database::{with_timeout, DatabaseError, UserStore, WalletStore};
use crate::middleware::response::ResponseEnvelope;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Cannot find data user!")]
    OwnerNotFound,
    #[error("No wallet corresponding with user account {owner_name}")]
    NoRecords { owner_name: String },
    #[error("Wallet not found")]
    WalletNotFound,
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

/// Owner-scoped wallet queries
pub struct WalletService {
    users: Arc<dyn UserStore>,
    wallets: Arc<dyn WalletStore>,
    timeout: Duration,
}

impl WalletService {
    pub fn new(users: Arc<dyn UserStore>, wallets: Arc<dyn WalletStore>, timeout: Duration) -> Self {
        Self { users, wallets, timeout }
    }

    /// One page of the owner's wallets wrapped in a success envelope.
    ///
    /// The owner must exist before any wallet is fetched. A page with no items
    /// is reported as not found, both for owners without wallets and for
    /// page indexes past the last page.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        request: PageRequest,
    ) -> Result<ResponseEnvelope<PageResult<WalletResponse>>, ServiceError> {
        let owner = with_timeout(self.timeout, self.users.find_by_id(owner_id))
            .await?
            .ok_or(ServiceError::OwnerNotFound)?;

        let (wallets, total) = with_timeout(self.timeout, self.wallets.find_page_by_owner(owner_id, request)).await?;
        let page = PageResult::new(wallets, request, total);

        if page.is_empty() {
            tracing::debug!(
                owner_id = %owner_id,
                page = request.page(),
                total_data = total,
                "No wallets on requested page"
            );
            return Err(ServiceError::NoRecords { owner_name: owner.full_name });
        }

        Ok(ResponseEnvelope::success(page.map(WalletResponse::from)))
    }

    /// A single wallet, visible only to its owner
    pub async fn find_for_owner(&self, owner_id: Uuid, wallet_id: Uuid) -> Result<WalletResponse, ServiceError> {
        let wallet = with_timeout(self.timeout, self.wallets.find_by_id(wallet_id))
            .await?
            .filter(|w| w.owner_id == owner_id)
            .ok_or(ServiceError::WalletNotFound)?;

        Ok(wallet.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{User, Wallet};
    use crate::database::MemoryStore;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wallet store that counts page fetches and delegates to memory
    struct CountingWallets {
        inner: Arc<MemoryStore>,
        page_calls: AtomicUsize,
    }

    #[async_trait]
    impl WalletStore for CountingWallets {
        async fn find_page_by_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<(Vec<Wallet>, i64), DatabaseError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_page_by_owner(owner_id, page).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Wallet>, DatabaseError> {
            WalletStore::find_by_id(self.inner.as_ref(), id).await
        }
    }

    struct SlowUsers;

    #[async_trait]
    impl UserStore for SlowUsers {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, DatabaseError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(None)
        }
    }

    async fn store_with_wallets(count: usize) -> (Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let owner = User::new("Siti Rahma", "siti@example.com");
        store.insert_user(owner.clone()).await;
        for i in 0..count {
            let mut wallet = Wallet::new(owner.id, format!("wallet-{i}"), Decimal::new(1_000, 0), "IDR");
            wallet.created_at += chrono::Duration::seconds(i as i64);
            store.insert_wallet(wallet).await;
        }
        (store, owner)
    }

    fn service_over(store: Arc<MemoryStore>) -> WalletService {
        WalletService::new(store.clone(), store, Duration::from_secs(1))
    }

    fn page(page: u32, size: u32) -> PageRequest {
        PageRequest::new(page, size).unwrap()
    }

    #[tokio::test]
    async fn lists_first_page_with_totals() {
        let (store, owner) = store_with_wallets(5).await;
        let envelope = service_over(store).list_by_owner(owner.id, page(0, 2)).await.unwrap();

        assert_eq!(envelope.status(), StatusCode::OK);
        assert_eq!(envelope.message, "Success");
        let data = envelope.data.unwrap();
        assert_eq!(data.total_data, 5);
        assert_eq!(data.total_pages, 3);
        assert_eq!(data.items.len(), 2);
        assert_eq!(data.items[0].wallet_name, "wallet-0");
    }

    #[tokio::test]
    async fn last_page_may_be_partial() {
        let (store, owner) = store_with_wallets(5).await;
        let data = service_over(store).list_by_owner(owner.id, page(2, 2)).await.unwrap().data.unwrap();
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].wallet_name, "wallet-4");
    }

    #[tokio::test]
    async fn page_past_the_end_is_not_found() {
        let (store, owner) = store_with_wallets(5).await;
        let err = service_over(store).list_by_owner(owner.id, page(3, 2)).await.unwrap_err();
        assert_eq!(err.to_string(), "No wallet corresponding with user account Siti Rahma");
    }

    #[tokio::test]
    async fn owner_without_wallets_is_not_found() {
        let (store, owner) = store_with_wallets(0).await;
        let err = service_over(store).list_by_owner(owner.id, page(0, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoRecords { .. }));
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected_before_fetching_wallets() {
        let (store, _) = store_with_wallets(3).await;
        let wallets = Arc::new(CountingWallets {
            inner: store.clone(),
            page_calls: AtomicUsize::new(0),
        });
        let service = WalletService::new(store, wallets.clone(), Duration::from_secs(1));

        let err = service.list_by_owner(Uuid::new_v4(), page(0, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::OwnerNotFound));
        assert_eq!(err.to_string(), "Cannot find data user!");
        assert_eq!(wallets.page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let store = Arc::new(MemoryStore::new());
        let service = WalletService::new(Arc::new(SlowUsers), store, Duration::from_millis(20));
        let err = service.list_by_owner(Uuid::new_v4(), page(0, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(DatabaseError::Timeout(_))));
    }

    #[tokio::test]
    async fn wallet_detail_is_owner_scoped() {
        let (store, owner) = store_with_wallets(1).await;
        let other = Wallet::new(Uuid::new_v4(), "not mine", Decimal::ZERO, "IDR");
        let other_id = other.id;
        store.insert_wallet(other).await;
        let service = service_over(store.clone());

        let (mine, _) = store.find_page_by_owner(owner.id, page(0, 1)).await.unwrap();
        let found = service.find_for_owner(owner.id, mine[0].id).await.unwrap();
        assert_eq!(found.wallet_name, "wallet-0");

        let err = service.find_for_owner(owner.id, other_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::WalletNotFound));
    }
}
