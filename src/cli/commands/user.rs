use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{connect_store, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::User;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user that API keys can be issued to")]
    Create {
        #[arg(long, help = "Full name shown in wallet messages")]
        name: String,

        #[arg(long, help = "Contact email")]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { name, email } => {
            let (manager, store) = connect_store(config).await?;
            let user = User::new(name, email);
            store.insert_user(&user).await?;
            manager.close().await;

            output_success(
                &output_format,
                &format!("Created user {} ({})", user.full_name, user.id),
                Some(json!({ "user": user })),
            )
        }
    }
}
