use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Connect to Postgres using the loaded configuration.
/// Admin commands always talk to Postgres; the memory backend lives only inside a server.
pub async fn connect_store(config: &AppConfig) -> anyhow::Result<(DatabaseManager, PgStore)> {
    let manager = DatabaseManager::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot connect to database: {}", e))?;
    let store = PgStore::new(manager.pool().clone());
    Ok((manager, store))
}
