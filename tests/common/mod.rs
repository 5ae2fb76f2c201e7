#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use budgetku_api::app::build_app;
use budgetku_api::config::AppConfig;
use budgetku_api::database::models::{generate_key, ApiKeyRecord, User, Wallet};
use budgetku_api::database::{ApiKeyStore, DatabaseError, MemoryStore, Stores};

pub const OWNER_NAME: &str = "Siti Rahma";

/// Key store wrapper that counts lookups, so tests can prove the
/// authenticator was never consulted.
pub struct CountingKeys {
    inner: Arc<MemoryStore>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ApiKeyStore for CountingKeys {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, DatabaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_hash(key_hash).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The full application wired to an in-memory store holding one owner and one key.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub owner: User,
    pub api_key: String,
    key_lookups: Arc<AtomicUsize>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::development()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        Self::build(config, |stores| stores).await
    }

    /// `customize` may swap individual stores before the router is built
    pub async fn build(config: AppConfig, customize: impl FnOnce(Stores) -> Stores) -> Self {
        let store = Arc::new(MemoryStore::new());
        let owner = User::new(OWNER_NAME, "siti@example.com");
        store.insert_user(owner.clone()).await;

        let api_key = generate_key();
        store.insert_api_key(ApiKeyRecord::new("test", &api_key, owner.id, None)).await;

        let key_lookups = Arc::new(AtomicUsize::new(0));
        let mut stores = Stores::from_backend(store.clone());
        stores.api_keys = Arc::new(CountingKeys {
            inner: store.clone(),
            calls: key_lookups.clone(),
        });

        let router = build_app(customize(stores), &config).expect("application should build");

        Self {
            router,
            store,
            owner,
            api_key,
            key_lookups,
        }
    }

    pub fn key_lookups(&self) -> usize {
        self.key_lookups.load(Ordering::SeqCst)
    }

    /// Insert `count` wallets for the owner, one second apart
    pub async fn add_wallets(&self, count: usize) -> Vec<Wallet> {
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            let mut wallet = Wallet::new(self.owner.id, format!("wallet-{i}"), Decimal::new(100 * (i as i64 + 1), 0), "IDR");
            wallet.created_at += chrono::Duration::seconds(i as i64);
            self.store.insert_wallet(wallet.clone()).await;
            created.push(wallet);
        }
        created
    }

    /// Persist a key for `owner_id` and return the raw value
    pub async fn issue_key(&self, owner_id: Uuid, expires_at: Option<DateTime<Utc>>) -> String {
        let raw = generate_key();
        self.store.insert_api_key(ApiKeyRecord::new("extra", &raw, owner_id, expires_at)).await;
        raw
    }

    pub async fn get(&self, uri: &str, key: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get_authorized(&self, uri: &str) -> TestResponse {
        self.get(uri, Some(self.api_key.as_str())).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, headers, body }
    }
}

/// A real listener on a free port, for tests that go through a socket
pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(router: Router) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self { base_url, handle };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
