mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use budgetku_api::config::AppConfig;
use budgetku_api::database::{DatabaseError, StoreHealth};
use common::TestApp;

#[tokio::test]
async fn root_describes_the_service() {
    let app = TestApp::new().await;
    let res = app.get("/", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], "Budgetku API");
    assert_eq!(res.body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_is_ok_with_a_live_store() {
    let app = TestApp::new().await;
    let res = app.get("/health", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], "ok");
}

struct DownStore;

#[async_trait]
impl StoreHealth for DownStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::ConfigMissing("DATABASE_URL"))
    }
}

#[tokio::test]
async fn health_degrades_when_the_store_is_down() {
    let app = TestApp::build(AppConfig::development(), |mut stores| {
        stores.health = Arc::new(DownStore);
        stores
    })
    .await;
    let res = app.get("/health", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["code"], 503);
    assert_eq!(res.body["message"], "Database unavailable");
    assert!(res.body.get("data").is_none());
    assert!(!res.body.to_string().contains("DATABASE_URL"));
}

#[tokio::test]
async fn unknown_public_route_is_an_enveloped_not_found() {
    let app = TestApp::new().await;
    let res = app.get("/nope", None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["code"], 404);
    assert_eq!(res.body["message"], "Resource not found");
}
