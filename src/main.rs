#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();
    budgetku_api::init_tracing();

    let config = budgetku_api::config::config();
    tracing::info!("Starting Budgetku API in {:?} mode", config.environment);

    budgetku_api::app::serve(config).await
}
