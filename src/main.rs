//! Queuechat - terminal client for a queued chat backend
//!
//! Main entry point for the Queuechat application.

use anyhow::Result;

use queuechat::cli::{Cli, Commands};
use queuechat::commands;
use queuechat::config::Config;
use queuechat::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    logging::init_logging(&config.logging)?;

    // Validate configuration
    config.validate()?;
    tracing::debug!(base_url = %config.api.base_url, "Configuration loaded");

    // Execute command
    match cli.command {
        Commands::Chats { json } => commands::chats::list_chats(&config, json).await,
        Commands::Show { id, json } => commands::chats::show_chat(&config, id, json).await,
        Commands::Create(args) => {
            tracing::info!(title = %args.title, "Creating chat");
            commands::chats::create_chat(&config, args).await
        }
        Commands::Send {
            id,
            message,
            no_wait,
        } => commands::messages::send(&config, id, message, no_wait).await,
        Commands::Watch { id } => commands::messages::watch(&config, id).await,
        Commands::Register {
            email,
            username,
            password,
        } => commands::auth::register(&config, &email, &username, password).await,
        Commands::Login { email, password } => {
            commands::auth::login(&config, &email, password).await
        }
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Me => commands::auth::me(&config).await,
        Commands::ConfirmEmail { pin } => commands::auth::confirm_email(&config, &pin).await,
        Commands::NewKey => commands::auth::new_key(&config).await,
    }
}
