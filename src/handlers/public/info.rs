use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::with_timeout;
use crate::error::ApiError;
use crate::middleware::response::ResponseEnvelope;

/// GET / - service name, version and route overview
pub async fn root() -> ResponseEnvelope<Value> {
    ResponseEnvelope::success(json!({
        "name": "Budgetku API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "wallets": "/api/v1/wallet?page=&size= (api key)",
            "wallet": "/api/v1/wallet/:wallet_id (api key)",
            "whoami": "/api/v1/auth/whoami (api key)",
        }
    }))
}

/// GET /health - 200 while the store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> Result<ResponseEnvelope<Value>, ApiError> {
    if let Err(e) = with_timeout(state.store_timeout, state.health.ping()).await {
        tracing::warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(ResponseEnvelope::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok",
    })))
}
