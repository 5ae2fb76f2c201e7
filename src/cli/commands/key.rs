use chrono::{Duration, Utc};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{connect_store, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::{generate_key, ApiKeyRecord};
use crate::database::{PgStore, UserStore};

#[derive(Subcommand)]
pub enum KeyCommands {
    #[command(about = "Issue a new API key; the raw key is printed once")]
    Issue {
        #[arg(long, help = "Owner user id")]
        owner: Uuid,

        #[arg(long, help = "Label for the key, e.g. the client app")]
        name: String,

        #[arg(long, help = "Expire the key after this many days")]
        expires_in_days: Option<u32>,
    },

    #[command(about = "Revoke an API key by id")]
    Revoke {
        #[arg(help = "Key id")]
        id: Uuid,
    },

    #[command(about = "List an owner's API keys")]
    List {
        #[arg(long, help = "Owner user id")]
        owner: Uuid,
    },
}

pub async fn handle(cmd: KeyCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let (manager, store) = connect_store(config).await?;
    let result = execute(cmd, &store, output_format).await;
    manager.close().await;
    result
}

async fn execute(cmd: KeyCommands, store: &PgStore, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        KeyCommands::Issue { owner, name, expires_in_days } => {
            let user = UserStore::find_by_id(store, owner)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", owner))?;

            let expires_at = expires_in_days.map(|days| Utc::now() + Duration::days(i64::from(days)));
            let raw_key = generate_key();
            let record = ApiKeyRecord::new(name, &raw_key, user.id, expires_at);
            store.insert_api_key(&record).await?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "API key issued",
                    Some(json!({ "key": record, "api_key": raw_key })),
                ),
                OutputFormat::Text => {
                    println!("✓ Issued key '{}' ({}) for {}", record.name, record.id, user.full_name);
                    println!("{}", raw_key);
                    println!("Store it now; it cannot be shown again.");
                    Ok(())
                }
            }
        }
        KeyCommands::Revoke { id } => {
            store.revoke_api_key(id).await?;
            output_success(&output_format, &format!("Revoked key {}", id), Some(json!({ "id": id })))
        }
        KeyCommands::List { owner } => {
            let keys = store.list_api_keys(owner).await?;
            if keys.is_empty() {
                output_empty_collection(&output_format, "keys", "No API keys for this owner")
            } else {
                print_keys(&keys, &output_format)
            }
        }
    }
}

fn print_keys(keys: &[ApiKeyRecord], output_format: &OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "keys": keys }))?);
        }
        OutputFormat::Text => {
            let now = Utc::now();
            println!("{:<38} {:<20} {:<10} {}", "ID", "NAME", "STATUS", "EXPIRES");
            println!("{}", "-".repeat(90));
            for key in keys {
                let status = if key.revoked {
                    "revoked"
                } else if key.is_expired(now) {
                    "expired"
                } else {
                    "active"
                };
                let expires = key
                    .expires_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("{:<38} {:<20} {:<10} {}", key.id, key.name, status, expires);
            }
        }
    }
    Ok(())
}
