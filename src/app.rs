//! Router construction and server startup.

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::auth::KeyAuthenticator;
use crate::config::{AppConfig, Environment, PaginationConfig, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, StoreHealth, Stores};
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{build_pipeline, PipelineError};
use crate::services::WalletService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub wallets: Arc<WalletService>,
    pub health: Arc<dyn StoreHealth>,
    pub pagination: PaginationConfig,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(stores: &Stores, config: &AppConfig) -> Self {
        let store_timeout = config.store_timeout();
        Self {
            wallets: Arc::new(WalletService::new(stores.users.clone(), stores.wallets.clone(), store_timeout)),
            health: stores.health.clone(),
            pagination: config.pagination.clone(),
            store_timeout,
        }
    }
}

/// Routes only, without the filter chain
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Protected
        .route("/api/v1/wallet", get(handlers::wallet_list))
        .route("/api/v1/wallet/:wallet_id", get(handlers::wallet_get))
        .route("/api/v1/auth/whoami", get(handlers::whoami))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

/// The complete application: routes, filter chain and request tracing.
pub fn build_app(stores: Stores, config: &AppConfig) -> Result<Router, PipelineError> {
    let authenticator = Arc::new(KeyAuthenticator::new(stores.api_keys.clone(), config.store_timeout()));
    let router = routes(AppState::new(&stores, config));
    let app = build_pipeline(router, &config.pipeline(), authenticator)?;
    Ok(app.layer(TraceLayer::new_for_http()))
}

/// Open the configured store backend. The memory backend is seeded with a
/// demo user whose key is printed once to stdout.
pub async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    match config.database.backend {
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let (user, raw_key) = store.seed_demo().await;
            tracing::info!(owner_id = %user.id, "Seeded in-memory store with demo data");
            println!("Demo API key for {}: {}", user.full_name, raw_key);
            Ok(Stores::from_backend(store))
        }
        StoreBackend::Postgres => {
            let manager = DatabaseManager::connect(&config.database).await?;
            Ok(Stores::from_backend(Arc::new(PgStore::new(manager.pool().clone()))))
        }
    }
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    if config.environment == Environment::Production && config.pipeline().cors.allows_any_origin() {
        tracing::warn!("CORS allows any origin in production; set SECURITY_CORS_ORIGINS");
    }

    let stores = open_stores(config).await?;
    let app = build_app(stores, config)?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Budgetku API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
