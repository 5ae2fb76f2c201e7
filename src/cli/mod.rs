pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "budgetku")]
#[command(about = "Budgetku CLI - server control, schema setup and API key management")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve,

    #[command(about = "Create database tables if they do not exist")]
    Migrate,

    #[command(about = "User management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "API key management")]
    Key {
        #[command(subcommand)]
        cmd: commands::key::KeyCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Serve => crate::app::serve(config).await,
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, config, output_format).await,
        Commands::Key { cmd } => commands::key::handle(cmd, config, output_format).await,
    }
}
